use outbreak_core::SimulationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("no observed data provided")]
    NoObservations,

    #[error("no calibration parameters provided")]
    NoParameters,

    #[error("observation {index}: {reason}")]
    InvalidObservation { index: usize, reason: String },

    #[error("observation on day {day} is past the simulated window of {simulation_days} days")]
    ObservationOutOfRange { day: u32, simulation_days: u32 },

    #[error("parameter '{id}' has invalid bounds [{min}, {max}]")]
    InvalidBounds { id: String, min: f64, max: f64 },

    #[error("initial guess {value} for '{id}' is outside [{min}, {max}]")]
    InitialGuessOutOfBounds {
        id: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("expected {expected} parameter values, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    #[error("unknown loss '{0}' (expected sse, rmse, mae or weighted_sse)")]
    UnknownLoss(String),

    #[error("calibration needs a fixed seed so that every evaluation sees the same random numbers")]
    MissingSeed,

    #[error("optimization failed: {0}")]
    Optimizer(String),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

pub type CalibrationOutcome<T> = Result<T, CalibrationError>;
