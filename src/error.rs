//! Error types for trackvis.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions. Tick computation itself never fails; everything here
//! is raised either while building a topology, train set or config, or while
//! talking to the scheduler worker.

use thiserror::Error;

use crate::train::TrainId;

/// Validation errors raised while constructing topology, trains or config.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Topology must contain at least one station")]
    EmptyTopology,

    #[error("{what} position {value} is outside the track extent [0, 100]")]
    PositionOutOfRange {
        what: String,
        value: f64,
    },

    #[error("Train speed {value} must be finite and non-negative")]
    InvalidSpeed {
        value: f64,
    },

    #[error("Priority {value} is out of range [1, 10]")]
    PriorityOutOfRange {
        value: u8,
    },

    #[error("Field '{field}' cannot be empty")]
    EmptyField {
        field: String,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Duplicate station id: {id}")]
    DuplicateStation {
        id: String,
    },

    #[error("Duplicate signal id: {id}")]
    DuplicateSignal {
        id: String,
    },

    #[error("Duplicate train id: {id}")]
    DuplicateTrain {
        id: TrainId,
    },

    #[error("Speed multiplier {value} is not supported (expected one of 0.5, 1, 2, 5)")]
    UnsupportedSpeedMultiplier {
        value: f64,
    },

    #[error("Proximity threshold {value} must be finite and positive")]
    InvalidProximityThreshold {
        value: f64,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Execution errors raised by the simulator at runtime.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Train not found: {id}")]
    TrainNotFound {
        id: TrainId,
    },

    #[error("Simulator channel disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Command queue full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },
}

/// Errors raised while loading configuration from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    Parse {
        message: String,
    },
}

/// Top-level error type for trackvis.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TrackError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a config error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if retrying the same call could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Execution(e) => matches!(e, ExecutionError::Timeout { .. } | ExecutionError::QueueFull { .. }),
            Self::Validation(_) | Self::Config(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for trackvis operations.
pub type TrackResult<T> = Result<T, TrackError>;
