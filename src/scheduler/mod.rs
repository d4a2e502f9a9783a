//! Tick scheduling.
//!
//! A [`TrackSimulator`] runs a [`crate::Simulation`] on a dedicated thread and
//! fires ticks on a fixed wall-clock interval while playing. Observers attach
//! through [`SnapshotStream`]; they only ever read.

/// Snapshot event types.
pub mod events;
/// Observer stream handle.
pub mod stream;
/// Tick worker and its handle.
pub mod worker;

pub use events::{EventKind, SubscriptionId, TickEvent};
pub use stream::SnapshotStream;
pub use worker::TrackSimulator;
