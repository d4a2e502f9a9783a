//! Train kinematic state.
//!
//! A [`Train`] is a plain value. The simulator never mutates a train in
//! place; every tick produces a fresh record via [`crate::kinematics::update`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::topology::{check_position, SignalAspect, Topology};

/// Stable train identifier.
///
/// # Examples
///
/// ```
/// use trackvis::TrainId;
///
/// let id = TrainId::new("train1");
/// assert_eq!(id.as_str(), "train1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(String);

impl TrainId {
    /// Creates a train id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Service class of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainClass {
    /// Premium long-distance service.
    Superfast,
    /// Limited-stop service.
    Express,
    /// All-stations service.
    Passenger,
    /// Goods train.
    Freight,
}

impl fmt::Display for TrainClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Superfast => write!(f, "superfast"),
            Self::Express => write!(f, "express"),
            Self::Passenger => write!(f, "passenger"),
            Self::Freight => write!(f, "freight"),
        }
    }
}

/// Which of the two parallel lines a train runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Line {
    /// Up line.
    Up,
    /// Down line.
    Down,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Direction of travel along the extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Towards position 100.
    Forward,
    /// Towards position 0.
    Backward,
}

impl Direction {
    /// Sign applied to a displacement: `1.0` forward, `-1.0` backward.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
        }
    }
}

/// Displayed train status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    /// Moving, not near any station.
    Running,
    /// Held. Only ever set at initialization.
    Stopped,
    /// Within the proximity threshold of a station.
    Approaching,
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Approaching => write!(f, "approaching"),
        }
    }
}

/// Kinematic and display state of one train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    /// Train id.
    pub id: TrainId,
    /// Display name.
    pub name: String,
    /// Timetable designator, e.g. `"12001"`.
    pub number: String,
    /// Service class.
    pub class: TrainClass,
    /// Assigned line.
    pub line: Line,
    /// Position on the `[0, 100]` extent.
    pub position: f64,
    /// Speed in km/h. Never negative.
    pub speed: f64,
    /// Direction of travel.
    pub direction: Direction,
    /// Displayed status.
    pub status: TrainStatus,
    /// Name of the upcoming (or most recently approached) station.
    pub next_station: String,
    /// Aspect of the signal last passed.
    pub signal_aspect: SignalAspect,
    /// Informational priority, 1 (lowest) to 10.
    pub priority: u8,
}

impl Train {
    /// Starts building a train.
    #[must_use]
    pub fn builder() -> TrainBuilder {
        TrainBuilder::default()
    }

    /// Position in kilometres from the start of the line.
    #[must_use]
    pub fn position_km(&self, topology: &Topology) -> f64 {
        topology.position_to_km(self.position)
    }

    /// Checks the record's invariants.
    ///
    /// Fields are public, so trains assembled by hand (seed lists, JSON) are
    /// checked here before the simulator accepts them.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the id or name is blank, the position
    /// is outside `[0, 100]`, the speed is negative or not finite, or the
    /// priority is outside `1..=10`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "id".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "name".to_string(),
            });
        }
        check_position(|| format!("train '{}'", self.id), self.position)?;
        if !(self.speed.is_finite() && self.speed >= 0.0) {
            return Err(ValidationError::InvalidSpeed { value: self.speed });
        }
        if !(1..=10).contains(&self.priority) {
            return Err(ValidationError::PriorityOutOfRange { value: self.priority });
        }
        Ok(())
    }

    /// Returns true if the train is near a station.
    #[must_use]
    pub fn is_approaching(&self) -> bool {
        self.status == TrainStatus::Approaching
    }
}

/// Builder for [`Train`].
#[derive(Debug, Default, Clone)]
pub struct TrainBuilder {
    id: Option<TrainId>,
    name: Option<String>,
    number: Option<String>,
    class: Option<TrainClass>,
    line: Option<Line>,
    position: Option<f64>,
    speed: Option<f64>,
    direction: Option<Direction>,
    status: Option<TrainStatus>,
    next_station: Option<String>,
    signal_aspect: Option<SignalAspect>,
    priority: Option<u8>,
}

impl TrainBuilder {
    /// Sets the id.
    #[must_use]
    pub fn id(mut self, id: impl Into<TrainId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the timetable designator.
    #[must_use]
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Sets the service class.
    #[must_use]
    pub fn class(mut self, class: TrainClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Sets the line.
    #[must_use]
    pub fn line(mut self, line: Line) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the speed in km/h.
    #[must_use]
    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Sets the direction.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Sets the status. Defaults to `Running`.
    #[must_use]
    pub fn status(mut self, status: TrainStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the upcoming station name.
    #[must_use]
    pub fn next_station(mut self, name: impl Into<String>) -> Self {
        self.next_station = Some(name.into());
        self
    }

    /// Sets the signal aspect. Defaults to `Green`.
    #[must_use]
    pub fn signal_aspect(mut self, aspect: SignalAspect) -> Self {
        self.signal_aspect = Some(aspect);
        self
    }

    /// Sets the priority. Defaults to 5.
    #[must_use]
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Validates and builds the train.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a required field is missing or blank,
    /// the position is outside `[0, 100]`, the speed is negative or not finite,
    /// or the priority is outside `1..=10`.
    pub fn build(self) -> Result<Train, ValidationError> {
        let train = Train {
            id: self.id.ok_or_else(|| missing("id"))?,
            name: self.name.ok_or_else(|| missing("name"))?,
            number: self.number.unwrap_or_default(),
            class: self.class.ok_or_else(|| missing("class"))?,
            line: self.line.ok_or_else(|| missing("line"))?,
            position: self.position.ok_or_else(|| missing("position"))?,
            speed: self.speed.ok_or_else(|| missing("speed"))?,
            direction: self.direction.ok_or_else(|| missing("direction"))?,
            status: self.status.unwrap_or(TrainStatus::Running),
            next_station: self.next_station.unwrap_or_default(),
            signal_aspect: self.signal_aspect.unwrap_or(SignalAspect::Green),
            priority: self.priority.unwrap_or(5),
        };
        train.validate()?;
        Ok(train)
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
}
