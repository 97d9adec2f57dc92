use outbreak_core::{Configuration, EnsembleResult, SimulationEngine, SimulationResult};

use crate::ensemble::{CancellationToken, EnsembleRunner, ExecutionMode};

/// Per-individual stochastic model behind the [`SimulationEngine`] interface
#[derive(Clone, Debug)]
pub struct StochasticEngine {
    configuration: Configuration,
    execution_mode: ExecutionMode,
    cancellation: Option<CancellationToken>,
}

impl StochasticEngine {
    /// Create an engine for `configuration`. Validation happens on every run, after
    /// parameter updates have been applied.
    pub fn from_configuration(configuration: Configuration) -> Self {
        Self {
            configuration,
            execution_mode: ExecutionMode::default(),
            cancellation: None,
        }
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    fn runner(&self) -> EnsembleRunner<'_> {
        let runner =
            EnsembleRunner::new(&self.configuration).with_execution_mode(self.execution_mode);
        match &self.cancellation {
            Some(token) => runner.with_cancellation(token.clone()),
            None => runner,
        }
    }
}

impl SimulationEngine for StochasticEngine {
    fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn set_parameter(&mut self, parameter_id: &str, value: f64) -> SimulationResult<()> {
        self.configuration.set_parameter(parameter_id, value)
    }

    fn set_seed(&mut self, seed: Option<u64>) {
        self.configuration.seed = seed;
    }

    fn run(&self) -> SimulationResult<EnsembleResult> {
        self.runner().run()
    }
}
