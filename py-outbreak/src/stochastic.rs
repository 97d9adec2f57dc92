//! Python bindings for outbreak-stochastic.

use outbreak_core::SimulationEngine;
use outbreak_stochastic::{ExecutionMode, StochasticEngine};
use pyo3::prelude::*;

use crate::core::{PyConfiguration, PyEnsembleResult};
use crate::simulation_err;

fn execution_mode(parallel: bool) -> ExecutionMode {
    if parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    }
}

/// Wrapper for outbreak_stochastic::StochasticEngine
#[pyclass(name = "StochasticEngine")]
#[derive(Clone)]
pub struct PyStochasticEngine {
    inner: StochasticEngine,
}

impl PyStochasticEngine {
    pub fn inner(&self) -> &StochasticEngine {
        &self.inner
    }
}

impl From<StochasticEngine> for PyStochasticEngine {
    fn from(inner: StochasticEngine) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl PyStochasticEngine {
    /// Create an engine. Trials run on a thread pool unless `parallel` is false.
    #[new]
    #[pyo3(signature = (configuration, parallel=true))]
    fn new(configuration: &PyConfiguration, parallel: bool) -> Self {
        Self {
            inner: StochasticEngine::from_configuration(configuration.inner.clone())
                .with_execution_mode(execution_mode(parallel)),
        }
    }

    #[getter]
    fn configuration(&self) -> PyConfiguration {
        PyConfiguration {
            inner: self.inner.configuration().clone(),
        }
    }

    fn parameter(&self, parameter_id: &str) -> PyResult<f64> {
        self.inner.parameter(parameter_id).map_err(simulation_err)
    }

    fn set_parameter(&mut self, parameter_id: &str, value: f64) -> PyResult<()> {
        self.inner
            .set_parameter(parameter_id, value)
            .map_err(simulation_err)
    }

    #[pyo3(signature = (seed=None))]
    fn set_seed(&mut self, seed: Option<u64>) {
        self.inner.set_seed(seed);
    }

    /// Run the ensemble with the GIL released
    fn run(&self, py: Python<'_>) -> PyResult<PyEnsembleResult> {
        let engine = self.inner.clone();
        let inner = py.allow_threads(move || engine.run()).map_err(simulation_err)?;
        Ok(PyEnsembleResult { inner })
    }
}

/// Run an ensemble for `configuration`
#[pyfunction]
#[pyo3(signature = (configuration, parallel=true))]
fn run_ensemble(
    py: Python<'_>,
    configuration: &PyConfiguration,
    parallel: bool,
) -> PyResult<PyEnsembleResult> {
    let engine = StochasticEngine::from_configuration(configuration.inner.clone())
        .with_execution_mode(execution_mode(parallel));
    let inner = py.allow_threads(move || engine.run()).map_err(simulation_err)?;
    Ok(PyEnsembleResult { inner })
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyStochasticEngine>()?;
    m.add_function(wrap_pyfunction!(run_ensemble, m)?)?;
    Ok(())
}
