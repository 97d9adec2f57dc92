use thiserror::Error;

/// Errors that can occur while configuring or running a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A configuration field is outside its valid range. Raised before any trial runs.
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },

    /// A hazard probability evaluated to NaN or left [0, 1]
    #[error("Hazard curve '{curve}' is out of domain at day {day}: {value}")]
    NumericDomain {
        curve: &'static str,
        day: usize,
        value: f64,
    },

    #[error("Ensemble cancelled after {completed} of {requested} trials")]
    Cancelled { completed: usize, requested: usize },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationError {
    pub(crate) fn invalid(name: &str, value: f64, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.into(),
        }
    }

    /// True for errors the caller can fix by supplying different input
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

pub type SimulationResult<T> = Result<T, SimulationError>;
