//! Headless track simulator.
//!
//! Runs the reference line on its tick thread and logs train positions, or
//! prints every snapshot as a JSON line for a presentation layer to consume.
//!
//! ```bash
//! cargo run --features cli --bin trackvis-sim -- --ticks 200 --speed 2 --json
//! ```

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use trackvis::{EventKind, SimulatorConfig, SpeedMultiplier, TrackError, TrackSimulator};

/// Track position simulator
#[derive(Parser, Debug)]
#[command(name = "trackvis-sim")]
#[command(about = "Run the reference track simulation headless")]
struct Args {
    /// Number of ticks to run before exiting
    #[arg(short, long, default_value = "100")]
    ticks: u64,

    /// Speed multiplier (0.5, 1, 2 or 5)
    #[arg(short, long, default_value = "1")]
    speed: f64,

    /// Override the tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print each snapshot as a JSON line on stdout
    #[arg(long)]
    json: bool,

    /// Reset the trains to their seed positions before running
    #[arg(long)]
    reset: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,trackvis=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<(), TrackError> {
    let mut config = match &args.config {
        Some(path) => SimulatorConfig::from_path(path)?,
        None => SimulatorConfig::default(),
    };
    if let Some(ms) = args.interval_ms {
        config.tick_interval_ms = ms;
    }
    config.initial_speed = SpeedMultiplier::try_from(args.speed)?;
    // Subscribe before the first tick so nothing is missed.
    config.start_playing = false;

    let sim = TrackSimulator::reference(&config)?;
    if args.reset {
        sim.reset()?;
    }

    let topology = sim.topology();
    info!(
        stations = topology.stations().len(),
        signals = topology.signals().len(),
        length_km = topology.extent_km(),
        "loaded reference line"
    );

    let stream = sim.subscribe()?;
    sim.play()?;

    let wait = config.tick_interval() * 10 + Duration::from_secs(1);
    let mut seen = 0;
    while seen < args.ticks {
        let event = stream.recv_timeout(wait)?;
        if event.kind != EventKind::Tick {
            continue;
        }
        seen += 1;

        if args.json {
            let line = serde_json::to_string(&event).map_err(|e| TrackError::internal(e.to_string()))?;
            println!("{line}");
        } else {
            for t in event.trains.iter() {
                info!(
                    tick = event.tick(),
                    train = %t.id,
                    line = %t.line,
                    km = t.position_km(&topology),
                    status = %t.status,
                    next = %t.next_station,
                    "position"
                );
            }
        }
    }

    sim.pause()?;
    let dropped = sim.dropped_events();
    if dropped > 0 {
        info!(dropped, "snapshot events dropped by slow output");
    }
    sim.shutdown();
    Ok(())
}

fn main() {
    init_logging();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}
