//! Simulator configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TrackResult, ValidationError};
use crate::kinematics::{SpeedMultiplier, TICK_MOVEMENT_FACTOR};

/// Runtime configuration for [`crate::Simulation`] and [`crate::TrackSimulator`].
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Wall-clock interval between ticks while playing.
    pub tick_interval_ms: u64,
    /// Normalized distance per tick per 100 km/h at 1×.
    pub movement_factor: f64,
    /// Speed multiplier in effect at startup.
    pub initial_speed: SpeedMultiplier,
    /// Whether the scheduler starts ticking immediately.
    pub start_playing: bool,
    /// Max queued commands to the scheduler worker.
    pub command_queue_capacity: usize,
    /// Per-subscriber snapshot buffer.
    pub stream_capacity: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            movement_factor: TICK_MOVEMENT_FACTOR,
            initial_speed: SpeedMultiplier::Normal,
            start_playing: true,
            command_queue_capacity: 256,
            stream_capacity: 1024,
        }
    }
}

impl SimulatorConfig {
    /// Tick interval as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidConfig {
            reason: reason.to_string(),
        };
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be greater than zero"));
        }
        if !(self.movement_factor.is_finite() && self.movement_factor > 0.0) {
            return Err(invalid("movement_factor must be finite and positive"));
        }
        if self.command_queue_capacity == 0 {
            return Err(invalid("command_queue_capacity must be greater than zero"));
        }
        if self.stream_capacity == 0 {
            return Err(invalid("stream_capacity must be greater than zero"));
        }
        Ok(())
    }

    /// Parses and validates a JSON config.
    ///
    /// # Errors
    ///
    /// Returns a config error on malformed JSON, or a validation error if a
    /// value is out of range.
    pub fn from_json_str(json: &str) -> TrackResult<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse { message: e.to_string() })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns a config error if the file cannot be read or parsed, or a
    /// validation error if a value is out of range.
    pub fn from_path(path: impl AsRef<Path>) -> TrackResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
