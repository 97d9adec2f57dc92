//! Core types for the stochastic outbreak detection engine: configuration, disease
//! presets, hazard curves, trial trajectories and ensemble results.

pub mod config;
pub mod engine;
pub mod error;
pub mod hazard;
pub mod presets;
pub mod state;
pub mod stats;

pub use config::{Configuration, ContactMode, TestingMode, Transmission, PARAMETER_IDS};
pub use engine::SimulationEngine;
pub use error::{SimulationError, SimulationResult};
pub use hazard::{HazardCurves, HOSPITALISATION_SHAPE, RECOVERY_SHAPE};
pub use presets::{DiseasePreset, DISEASE_PRESETS};
pub use state::{
    DailyCounters, DetectionSummary, EnsembleResult, MeanTrajectories, Series, TrialState,
    TENTH_DETECTION_THRESHOLD,
};
