//! Tick worker.
//!
//! The worker thread is the only owner of the [`Simulation`]. Every control
//! call and every query is a message on one bounded command channel, handled
//! between ticks, so no caller can see a train set mid-update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, never, select, tick, Receiver, Sender, TrySendError};
use tracing::{debug, info, trace, warn};

use crate::config::SimulatorConfig;
use crate::error::{ExecutionError, TrackError, TrackResult};
use crate::kinematics::SpeedMultiplier;
use crate::simulation::{Simulation, SimulationState};
use crate::topology::Topology;
use crate::train::{Line, Train, TrainId};

use super::events::{EventKind, SubscriptionId, TickEvent};
use super::stream::SnapshotStream;

const COMMAND_PATH: &str = "scheduler_command";

#[derive(Debug)]
pub(crate) enum Command {
    Play {
        reply: Sender<()>,
    },
    Pause {
        reply: Sender<()>,
    },
    Reset {
        reply: Sender<()>,
    },
    SetSpeed {
        speed: SpeedMultiplier,
        reply: Sender<()>,
    },
    Select {
        id: Option<TrainId>,
        reply: Sender<TrackResult<()>>,
    },
    Step {
        ticks: u32,
        reply: Sender<u64>,
    },
    Trains {
        reply: Sender<Arc<[Train]>>,
    },
    Selected {
        reply: Sender<Option<Train>>,
    },
    State {
        reply: Sender<SimulationState>,
    },
    Subscribe {
        subscription_id: SubscriptionId,
        tx: Sender<TickEvent>,
        reply: Sender<()>,
    },
    Unsubscribe {
        subscription_id: SubscriptionId,
    },
    Shutdown,
}

/// Handle to a simulation running on its own tick thread.
///
/// Ticks fire every `tick_interval_ms` while playing. Pausing drops the
/// ticker entirely; playing again arms a fresh one, so intervals that elapsed
/// while paused are never replayed.
///
/// Dropping the handle stops the worker and joins it.
#[derive(Debug)]
pub struct TrackSimulator {
    topology: Arc<Topology>,
    command_tx: Sender<Command>,
    queue_capacity: usize,
    stream_capacity: usize,
    dropped_events: Arc<AtomicU64>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl TrackSimulator {
    /// Starts a worker for `simulation`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid config, or an internal error
    /// if the worker thread cannot be spawned.
    pub fn spawn(simulation: Simulation, config: &SimulatorConfig) -> TrackResult<Self> {
        config.validate()?;

        let queue_capacity = config.command_queue_capacity;
        let (command_tx, command_rx) = bounded::<Command>(queue_capacity);
        let dropped_events = Arc::new(AtomicU64::new(0));
        let topology = Arc::clone(simulation.topology());

        let interval = config.tick_interval();
        let thread_dropped = Arc::clone(&dropped_events);
        let join = thread::Builder::new()
            .name("trackvis-ticker".to_string())
            .spawn(move || worker_loop(simulation, interval, command_rx, thread_dropped))
            .map_err(|e| TrackError::internal(format!("failed to spawn tick worker: {e}")))?;

        Ok(Self {
            topology,
            command_tx,
            queue_capacity,
            stream_capacity: config.stream_capacity,
            dropped_events,
            join: Mutex::new(Some(join)),
        })
    }

    /// Starts the reference simulation.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::spawn`].
    pub fn reference(config: &SimulatorConfig) -> TrackResult<Self> {
        Self::spawn(Simulation::reference(config)?, config)
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> TrackResult<T> {
        let (reply_tx, reply_rx) = bounded::<T>(1);
        self.submit(make(reply_tx))?;
        reply_rx.recv().map_err(|_| {
            TrackError::Execution(ExecutionError::Disconnected {
                path: COMMAND_PATH.to_string(),
            })
        })
    }

    fn submit(&self, cmd: Command) -> TrackResult<()> {
        match self.command_tx.try_send(cmd) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(TrackError::Execution(ExecutionError::QueueFull {
                capacity: self.queue_capacity,
            })),
            Err(TrySendError::Disconnected(_)) => Err(TrackError::Execution(ExecutionError::Disconnected {
                path: COMMAND_PATH.to_string(),
            })),
        }
    }

    /// The read-only topology. Does not round-trip through the worker.
    #[must_use]
    pub fn topology(&self) -> Arc<Topology> {
        Arc::clone(&self.topology)
    }

    /// Current train snapshot.
    ///
    /// # Errors
    ///
    /// Returns an execution error if the worker is gone or its queue is full.
    pub fn trains(&self) -> TrackResult<Arc<[Train]>> {
        self.request(|reply| Command::Trains { reply })
    }

    /// Trains on one line, in store order.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn trains_on_line(&self, line: Line) -> TrackResult<Vec<Train>> {
        Ok(self.trains()?.iter().filter(|t| t.line == line).cloned().collect())
    }

    /// Control state.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn state(&self) -> TrackResult<SimulationState> {
        self.request(|reply| Command::State { reply })
    }

    /// Resumes ticking from the current positions.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn play(&self) -> TrackResult<()> {
        self.request(|reply| Command::Play { reply })
    }

    /// Suspends ticking. Takes effect before this call returns.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn pause(&self) -> TrackResult<()> {
        self.request(|reply| Command::Pause { reply })
    }

    /// Same as [`TrackSimulator::play`].
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn start(&self) -> TrackResult<()> {
        self.play()
    }

    /// Same as [`TrackSimulator::pause`].
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn stop(&self) -> TrackResult<()> {
        self.pause()
    }

    /// Restores the reset seed. Play state is unchanged.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn reset(&self) -> TrackResult<()> {
        self.request(|reply| Command::Reset { reply })
    }

    /// Changes the speed multiplier for subsequent ticks.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn set_speed_multiplier(&self, speed: SpeedMultiplier) -> TrackResult<()> {
        self.request(|reply| Command::SetSpeed { speed, reply })
    }

    /// Highlights a train, or clears the highlight with `None`.
    ///
    /// # Errors
    ///
    /// Returns `TrainNotFound` for an unknown id, or an execution error if the
    /// worker is unreachable.
    pub fn select_train(&self, id: Option<TrainId>) -> TrackResult<()> {
        self.request(|reply| Command::Select { id, reply })?
    }

    /// The highlighted train as of now.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn selected_train(&self) -> TrackResult<Option<Train>> {
        self.request(|reply| Command::Selected { reply })
    }

    /// Applies `ticks` ticks immediately, playing or not. Returns the tick count.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn step(&self, ticks: u32) -> TrackResult<u64> {
        self.request(|reply| Command::Step { ticks, reply })
    }

    /// Subscribes to snapshots. The first event is an `Initial` snapshot of the
    /// current state, followed by one event per tick or reset.
    ///
    /// # Errors
    ///
    /// See [`TrackSimulator::trains`].
    pub fn subscribe(&self) -> TrackResult<SnapshotStream> {
        let subscription_id = SubscriptionId::new();
        let (tx, rx) = bounded::<TickEvent>(self.stream_capacity);
        self.request(|reply| Command::Subscribe {
            subscription_id,
            tx,
            reply,
        })?;
        Ok(SnapshotStream::new(subscription_id, rx, self.command_tx.clone()))
    }

    /// Events dropped because a subscriber's buffer was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Stops the worker and waits for it to exit.
    pub fn shutdown(self) {
        drop(self);
    }

    fn stop_worker(&self) {
        // Blocking send is fine: the worker drains the queue until it sees this.
        let _ = self.command_tx.send(Command::Shutdown);
        if let Ok(mut guard) = self.join.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for TrackSimulator {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

struct Subscribers {
    txs: HashMap<SubscriptionId, Sender<TickEvent>>,
    dropped: Arc<AtomicU64>,
}

impl Subscribers {
    fn publish(&mut self, kind: EventKind, sim: &Simulation) {
        if self.txs.is_empty() {
            return;
        }
        let event = TickEvent::new(kind, sim.state(), sim.trains());
        let dropped = &self.dropped;
        self.txs.retain(|id, tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                warn!(subscription = %id, tick = event.tick(), "snapshot stream full; event dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!(subscription = %id, "snapshot stream closed");
                false
            }
        });
    }
}

fn ticker_for(sim: &Simulation, interval: Duration) -> Receiver<Instant> {
    if sim.is_playing() {
        tick(interval)
    } else {
        never()
    }
}

enum Flow {
    Continue,
    Arm,
    Disarm,
    Exit,
}

fn handle_command(sim: &mut Simulation, subs: &mut Subscribers, cmd: Command) -> Flow {
    match cmd {
        Command::Play { reply } => {
            let flow = if sim.is_playing() {
                Flow::Continue
            } else {
                sim.play();
                info!(tick = sim.state().tick, "simulation playing");
                Flow::Arm
            };
            let _ = reply.send(());
            flow
        }
        Command::Pause { reply } => {
            let flow = if sim.is_playing() {
                sim.pause();
                info!(tick = sim.state().tick, "simulation paused");
                Flow::Disarm
            } else {
                Flow::Continue
            };
            let _ = reply.send(());
            flow
        }
        Command::Reset { reply } => {
            sim.reset();
            info!("simulation reset to seed");
            subs.publish(EventKind::Reset, sim);
            let _ = reply.send(());
            Flow::Continue
        }
        Command::SetSpeed { speed, reply } => {
            sim.set_speed_multiplier(speed);
            debug!(%speed, "speed multiplier changed");
            let _ = reply.send(());
            Flow::Continue
        }
        Command::Select { id, reply } => {
            let result = sim.select_train(id);
            debug!(selected = ?sim.state().selected, "selection changed");
            let _ = reply.send(result);
            Flow::Continue
        }
        Command::Step { ticks, reply } => {
            for _ in 0..ticks {
                sim.tick();
                subs.publish(EventKind::Tick, sim);
            }
            let _ = reply.send(sim.state().tick);
            Flow::Continue
        }
        Command::Trains { reply } => {
            let _ = reply.send(sim.trains());
            Flow::Continue
        }
        Command::Selected { reply } => {
            let _ = reply.send(sim.selected_train().cloned());
            Flow::Continue
        }
        Command::State { reply } => {
            let _ = reply.send(sim.state());
            Flow::Continue
        }
        Command::Subscribe {
            subscription_id,
            tx,
            reply,
        } => {
            let initial = TickEvent::new(EventKind::Initial, sim.state(), sim.trains());
            let _ = tx.try_send(initial);
            subs.txs.insert(subscription_id, tx);
            debug!(subscription = %subscription_id, "snapshot stream opened");
            let _ = reply.send(());
            Flow::Continue
        }
        Command::Unsubscribe { subscription_id } => {
            subs.txs.remove(&subscription_id);
            Flow::Continue
        }
        Command::Shutdown => Flow::Exit,
    }
}

fn worker_loop(mut sim: Simulation, interval: Duration, command_rx: Receiver<Command>, dropped: Arc<AtomicU64>) {
    let mut subs = Subscribers {
        txs: HashMap::new(),
        dropped,
    };
    let mut ticker = ticker_for(&sim, interval);

    info!(
        interval_ms = interval.as_millis().min(u128::from(u64::MAX)) as u64,
        trains = sim.trains().len(),
        playing = sim.is_playing(),
        "tick worker started"
    );

    loop {
        let msg = select! {
            recv(command_rx) -> msg => Some(msg),
            recv(ticker) -> _instant => None,
        };

        match msg {
            None => {
                let n = sim.tick();
                trace!(tick = n, "tick");
                subs.publish(EventKind::Tick, &sim);
            }
            Some(Err(_)) => break,
            Some(Ok(cmd)) => match handle_command(&mut sim, &mut subs, cmd) {
                Flow::Continue => {}
                // A fresh ticker: nothing that elapsed while paused is replayed.
                Flow::Arm => ticker = tick(interval),
                Flow::Disarm => ticker = never(),
                Flow::Exit => break,
            },
        }
    }

    info!(tick = sim.state().tick, "tick worker stopped");
}
