use crate::config::Configuration;
use crate::error::SimulationResult;
use crate::state::EnsembleResult;

/// Common interface for ensemble engines.
///
/// Calibration and the Python bindings only talk to this trait, so any model that can be
/// parameterised by name and run to completion plugs into them.
pub trait SimulationEngine: Clone {
    /// Configuration the next run will use
    fn configuration(&self) -> &Configuration;

    /// Read a named parameter
    fn parameter(&self, parameter_id: &str) -> SimulationResult<f64> {
        self.configuration().parameter(parameter_id)
    }

    /// Overwrite a named parameter for subsequent runs
    fn set_parameter(&mut self, parameter_id: &str, value: f64) -> SimulationResult<()>;

    /// Replace the base seed for subsequent runs
    fn set_seed(&mut self, seed: Option<u64>);

    /// Run the whole ensemble to completion
    fn run(&self) -> SimulationResult<EnsembleResult>;
}
