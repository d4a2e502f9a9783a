//! Snapshot events delivered to observers.
//!
//! Events are serializable so a presentation layer can forward them as JSON
//! without re-shaping.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::simulation::SimulationState;
use crate::train::Train;

/// Unique identifier for a snapshot subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// First event on a fresh subscription.
    Initial,
    /// One tick was applied.
    Tick,
    /// Trains were restored to the reset seed.
    Reset,
}

/// A train-set snapshot together with the control state it was taken under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    /// Why the event was emitted.
    pub kind: EventKind,
    /// Wall-clock time the worker produced the snapshot.
    pub at: DateTime<Utc>,
    /// Control state after the change.
    pub state: SimulationState,
    /// Trains after the change.
    pub trains: Arc<[Train]>,
}

impl TickEvent {
    pub(crate) fn new(kind: EventKind, state: SimulationState, trains: Arc<[Train]>) -> Self {
        Self {
            kind,
            at: Utc::now(),
            state,
            trains,
        }
    }

    /// Tick count the snapshot corresponds to.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.state.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::SpeedMultiplier;
    use crate::seed;

    #[test]
    fn test_event_serializes_as_json() {
        let state = SimulationState {
            playing: true,
            speed: SpeedMultiplier::Double,
            tick: 7,
            selected: None,
        };
        let ev = TickEvent::new(EventKind::Tick, state, seed::initial_trains().into());
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["kind"], "tick");
        assert_eq!(json["state"]["tick"], 7);
        assert_eq!(json["state"]["speed"], 2.0);
        assert_eq!(json["trains"][1]["line"], "down");

        let back: TickEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.tick(), 7);
        assert_eq!(back.trains.len(), 2);
    }

    #[test]
    fn test_subscription_ids_unique() {
        assert_ne!(SubscriptionId::new(), SubscriptionId::new());
    }
}
