//! Position update rule.
//!
//! Pure functions only: no clock, no channel, no shared state. The scheduler
//! calls [`update`] once per train per tick; tests call it directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::topology::{Topology, TRACK_END, TRACK_START};
use crate::train::{Direction, Train, TrainStatus};

/// Normalized distance covered per tick per 100 km/h at 1× speed.
pub const TICK_MOVEMENT_FACTOR: f64 = 0.5;

/// Simulated-time scaling applied to every tick's displacement.
///
/// Only the four presets offered by the control room are valid.
///
/// # Examples
///
/// ```
/// use trackvis::SpeedMultiplier;
///
/// let m = SpeedMultiplier::try_from(2.0).unwrap();
/// assert_eq!(m, SpeedMultiplier::Double);
/// assert!(SpeedMultiplier::try_from(3.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum SpeedMultiplier {
    /// 0.5×
    Half,
    /// 1×
    #[default]
    Normal,
    /// 2×
    Double,
    /// 5×
    Quintuple,
}

impl SpeedMultiplier {
    /// All presets in ascending order.
    pub const ALL: [Self; 4] = [Self::Half, Self::Normal, Self::Double, Self::Quintuple];

    /// The scaling factor.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Half => 0.5,
            Self::Normal => 1.0,
            Self::Double => 2.0,
            Self::Quintuple => 5.0,
        }
    }
}

impl TryFrom<f64> for SpeedMultiplier {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|m| (m.factor() - value).abs() < f64::EPSILON)
            .ok_or(ValidationError::UnsupportedSpeedMultiplier { value })
    }
}

impl From<SpeedMultiplier> for f64 {
    fn from(m: SpeedMultiplier) -> Self {
        m.factor()
    }
}

impl fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Distance a train at `speed` covers over `elapsed_ticks`.
#[must_use]
pub fn displacement(speed: f64, multiplier: SpeedMultiplier, movement_factor: f64, elapsed_ticks: u32) -> f64 {
    (speed / 100.0) * multiplier.factor() * movement_factor * f64::from(elapsed_ticks)
}

/// Moves `position` by `amount` in `direction`, clamping at the extremities.
///
/// Trains are never wrapped or reversed: a forward train pinned at 100 stays
/// at 100 and keeps reporting `Forward`.
#[must_use]
pub fn advance(position: f64, direction: Direction, amount: f64) -> f64 {
    match direction {
        Direction::Forward => (position + amount).min(TRACK_END),
        Direction::Backward => (position - amount).max(TRACK_START),
    }
}

/// Computes a train's state after `elapsed_ticks` at the reference movement factor.
///
/// Status is re-derived from the new position: `Approaching` with
/// `next_station` set to the first in-range station (ascending position), or
/// `Running` with `next_station` left as it was. Every other field is copied.
///
/// # Examples
///
/// ```
/// use trackvis::kinematics::update;
/// use trackvis::{seed, SpeedMultiplier, TrainStatus};
///
/// let topology = seed::reference_topology();
/// let train = seed::initial_trains().remove(0);
/// let next = update(&train, &topology, 1, SpeedMultiplier::Normal);
/// assert!((next.position - 25.475).abs() < 1e-9);
/// assert_eq!(next.status, TrainStatus::Running);
/// ```
#[must_use]
pub fn update(train: &Train, topology: &Topology, elapsed_ticks: u32, multiplier: SpeedMultiplier) -> Train {
    update_with_factor(train, topology, elapsed_ticks, multiplier, TICK_MOVEMENT_FACTOR)
}

/// [`update`] with an explicit movement factor.
#[must_use]
pub fn update_with_factor(
    train: &Train,
    topology: &Topology,
    elapsed_ticks: u32,
    multiplier: SpeedMultiplier,
    movement_factor: f64,
) -> Train {
    let amount = displacement(train.speed, multiplier, movement_factor, elapsed_ticks);
    let position = advance(train.position, train.direction, amount);

    let (status, next_station) = match topology.nearest_station(position) {
        Some(station) => (TrainStatus::Approaching, station.name.clone()),
        None => (TrainStatus::Running, train.next_station.clone()),
    };

    Train {
        position,
        status,
        next_station,
        ..train.clone()
    }
}
