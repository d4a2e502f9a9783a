//! # trackvis - track position simulator
//!
//! Trains move along a shared, normalized line (`0..=100`) carrying stations
//! and signals. A fixed-interval tick advances every train, clamps it at the
//! track ends, and flags it as approaching whenever a station lies within the
//! proximity threshold.
//!
//! ## Layers
//!
//! - [`topology`]: immutable stations and signals
//! - [`train`]: the per-train record
//! - [`kinematics`]: the pure position update rule
//! - [`store`]: the atomically replaced train set
//! - [`simulation`]: the owned simulator object, no timer
//! - [`scheduler`]: the tick thread and snapshot streams
//!
//! ## Usage
//!
//! ```rust
//! use trackvis::{Simulation, SimulatorConfig, SpeedMultiplier};
//!
//! let mut sim = Simulation::reference(&SimulatorConfig::default())?;
//! sim.set_speed_multiplier(SpeedMultiplier::Double);
//! sim.tick();
//!
//! let rajdhani = &sim.trains()[0];
//! assert!((rajdhani.position - 25.95).abs() < 1e-9);
//! # Ok::<(), trackvis::TrackError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod kinematics;
pub mod scheduler;
pub mod seed;
pub mod simulation;
pub mod store;
pub mod topology;
pub mod train;

pub use config::SimulatorConfig;
pub use error::{ConfigError, ExecutionError, TrackError, TrackResult, ValidationError};
pub use kinematics::{SpeedMultiplier, TICK_MOVEMENT_FACTOR};
pub use scheduler::{EventKind, SnapshotStream, SubscriptionId, TickEvent, TrackSimulator};
pub use simulation::{Simulation, SimulationState};
pub use store::TrainStore;
pub use topology::{Signal, SignalAspect, SignalKind, Station, StationKind, Topology};
pub use train::{Direction, Line, Train, TrainClass, TrainId, TrainStatus};
