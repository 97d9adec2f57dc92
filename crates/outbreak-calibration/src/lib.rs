//! Parameter calibration for outbreak engines.
//!
//! A [`CalibrationProblem`] wraps any [`outbreak_core::SimulationEngine`] together with
//! observed surveillance counts and exposes the ensemble's mean-trajectory loss as an
//! argmin cost function. [`optimize`] runs Nelder-Mead or particle swarm over it.

pub mod calibration_problem;
pub mod error;
pub mod optimization;
pub mod types;

pub use calibration_problem::CalibrationProblem;
pub use error::{CalibrationError, CalibrationOutcome};
pub use optimization::{
    optimize, optimize_with_observer, NelderMeadConfig, OptimizationConfig, ParticleSwarmConfig,
    SimplexState, SwarmState,
};
pub use types::{CalibrationParameter, CalibrationResult, LossConfig, ObservedDataPoint};
