//! Python bindings for outbreak-calibration.
//!
//! Observations and parameters are small frozen value classes; the optimizer is picked with
//! `Optimizer.nelder_mead(...)` or `Optimizer.particle_swarm(...)` and the loss by name.

use std::collections::HashMap;

use outbreak_calibration::{
    optimize_with_observer, CalibrationError, CalibrationParameter, CalibrationProblem,
    CalibrationResult, LossConfig, NelderMeadConfig, ObservedDataPoint, OptimizationConfig,
    ParticleSwarmConfig,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::python_observer::{write_to_python, PythonObserver};
use crate::simulation_err;
use crate::stochastic::PyStochasticEngine;

fn calibration_err(e: CalibrationError) -> PyErr {
    match e {
        CalibrationError::Simulation(e) => simulation_err(e),
        other @ CalibrationError::Optimizer(_) => PyRuntimeError::new_err(other.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Observed cumulative count of one series on a simulated day
#[pyclass(name = "Observation", frozen)]
#[derive(Clone)]
pub struct PyObservation {
    inner: ObservedDataPoint,
}

#[pymethods]
impl PyObservation {
    /// `series` is one of "infected", "hospitalized", "tested" or "recovered". `weight`
    /// only matters for the weighted_sse loss.
    #[new]
    #[pyo3(signature = (day, series, value, weight=1.0))]
    fn new(day: u32, series: String, value: f64, weight: f64) -> Self {
        Self {
            inner: ObservedDataPoint::with_weight(day, series, value, weight),
        }
    }

    #[getter]
    fn day(&self) -> u32 {
        self.inner.day
    }

    #[getter]
    fn series(&self) -> &str {
        &self.inner.series
    }

    #[getter]
    fn value(&self) -> f64 {
        self.inner.value
    }

    #[getter]
    fn weight(&self) -> f64 {
        self.inner.weight
    }

    fn __repr__(&self) -> String {
        format!(
            "Observation(day={}, series='{}', value={}, weight={})",
            self.inner.day, self.inner.series, self.inner.value, self.inner.weight
        )
    }
}

/// Engine parameter searched within `bounds`
#[pyclass(name = "Parameter", frozen)]
#[derive(Clone)]
pub struct PyParameter {
    inner: CalibrationParameter,
}

#[pymethods]
impl PyParameter {
    /// `id` is an engine parameter such as "r0", "transmission_prob" or "coverage". The
    /// search starts at `initial_guess`, or at the middle of `bounds` when omitted.
    #[new]
    #[pyo3(signature = (id, bounds, initial_guess=None))]
    fn new(id: String, bounds: (f64, f64), initial_guess: Option<f64>) -> Self {
        let (min, max) = bounds;
        let inner = match initial_guess {
            Some(guess) => CalibrationParameter::with_initial_guess(id, min, max, guess),
            None => CalibrationParameter::new(id, min, max),
        };
        Self { inner }
    }

    #[getter]
    fn id(&self) -> &str {
        &self.inner.id
    }

    #[getter]
    fn bounds(&self) -> (f64, f64) {
        (self.inner.min_bound, self.inner.max_bound)
    }

    #[getter]
    fn initial_value(&self) -> f64 {
        self.inner.initial_value()
    }

    fn __repr__(&self) -> String {
        format!(
            "Parameter(id='{}', bounds=({}, {}), initial_value={})",
            self.inner.id,
            self.inner.min_bound,
            self.inner.max_bound,
            self.inner.initial_value()
        )
    }
}

/// Optimization algorithm and its settings. Omitted settings keep the library defaults.
#[pyclass(name = "Optimizer", frozen)]
#[derive(Clone)]
pub struct PyOptimizer {
    inner: OptimizationConfig,
}

#[pymethods]
impl PyOptimizer {
    #[staticmethod]
    #[pyo3(signature = (
        max_iterations=None,
        sd_tolerance=None,
        alpha=None,
        gamma=None,
        rho=None,
        sigma=None,
        verbose=false,
    ))]
    fn nelder_mead(
        max_iterations: Option<u64>,
        sd_tolerance: Option<f64>,
        alpha: Option<f64>,
        gamma: Option<f64>,
        rho: Option<f64>,
        sigma: Option<f64>,
        verbose: bool,
    ) -> Self {
        let defaults = NelderMeadConfig::default();
        Self {
            inner: OptimizationConfig::NelderMead(NelderMeadConfig {
                max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
                sd_tolerance: sd_tolerance.unwrap_or(defaults.sd_tolerance),
                alpha,
                gamma,
                rho,
                sigma,
                verbose,
            }),
        }
    }

    #[staticmethod]
    #[pyo3(signature = (
        num_particles=None,
        max_iterations=None,
        target_cost=None,
        inertia_factor=None,
        cognitive_factor=None,
        social_factor=None,
        verbose=false,
    ))]
    fn particle_swarm(
        num_particles: Option<usize>,
        max_iterations: Option<u64>,
        target_cost: Option<f64>,
        inertia_factor: Option<f64>,
        cognitive_factor: Option<f64>,
        social_factor: Option<f64>,
        verbose: bool,
    ) -> Self {
        let defaults = ParticleSwarmConfig::default();
        Self {
            inner: OptimizationConfig::ParticleSwarm(ParticleSwarmConfig {
                num_particles: num_particles.unwrap_or(defaults.num_particles),
                max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
                target_cost,
                inertia_factor,
                cognitive_factor,
                social_factor,
                verbose,
            }),
        }
    }

    /// Parse `{"nelder_mead": {...}}` or `{"particle_swarm": {...}}`
    #[staticmethod]
    fn from_json(json_str: &str) -> PyResult<Self> {
        let inner = serde_json::from_str(json_str)
            .map_err(|e| PyValueError::new_err(format!("invalid optimizer config: {e}")))?;
        Ok(Self { inner })
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    #[getter]
    fn verbose(&self) -> bool {
        self.inner.verbose()
    }

    fn __repr__(&self) -> String {
        format!("Optimizer({:?})", self.inner)
    }
}

/// Outcome of a calibration run
#[pyclass(name = "CalibrationResult", frozen)]
pub struct PyCalibrationResult {
    inner: CalibrationResult,
}

#[pymethods]
impl PyCalibrationResult {
    /// Best value found for each parameter id
    #[getter]
    fn best_parameters(&self) -> HashMap<String, f64> {
        self.inner.parameters_map()
    }

    #[getter]
    fn final_loss(&self) -> f64 {
        self.inner.final_loss
    }

    #[getter]
    fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    fn converged(&self) -> bool {
        self.inner.converged
    }

    #[getter]
    fn termination_reason(&self) -> &str {
        &self.inner.termination_reason
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "CalibrationResult(best_parameters={:?}, loss={:.6}, iterations={})",
            self.inner.parameters_map(),
            self.inner.final_loss,
            self.inner.iterations
        )
    }
}

/// Fit `parameters` of a seeded engine to `observations`.
///
/// `loss` is "sse", "rmse", "mae" or "weighted_sse"; the default optimizer is Nelder-Mead.
/// The search runs with the GIL released.
#[pyfunction]
#[pyo3(signature = (engine, observations, parameters, loss="sse", optimizer=None))]
fn calibrate(
    py: Python<'_>,
    engine: &PyStochasticEngine,
    observations: Vec<PyObservation>,
    parameters: Vec<PyParameter>,
    loss: &str,
    optimizer: Option<PyOptimizer>,
) -> PyResult<PyCalibrationResult> {
    let loss: LossConfig = loss.parse().map_err(calibration_err)?;
    let problem = CalibrationProblem::new(
        engine.inner().clone(),
        observations.into_iter().map(|o| o.inner).collect(),
        parameters.into_iter().map(|p| p.inner).collect(),
        loss,
    )
    .map_err(calibration_err)?;

    let config = optimizer.map(|o| o.inner).unwrap_or_default();
    if config.verbose() {
        write_to_python(&format!(
            "Calibrating {:?} against {} loss",
            problem.parameter_names(),
            problem.loss_config()
        ));
    }

    let inner = py
        .allow_threads(move || {
            let observer = config.verbose().then(PythonObserver::new);
            optimize_with_observer(problem, config, observer)
        })
        .map_err(calibration_err)?;

    Ok(PyCalibrationResult { inner })
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyObservation>()?;
    m.add_class::<PyParameter>()?;
    m.add_class::<PyOptimizer>()?;
    m.add_class::<PyCalibrationResult>()?;
    m.add_function(wrap_pyfunction!(calibrate, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::{Configuration, SimulationEngine, SimulationError, Transmission};
    use outbreak_stochastic::{ExecutionMode, StochasticEngine};

    fn engine(seed: Option<u64>) -> PyStochasticEngine {
        let mut config = Configuration::default()
            .with_population(20_000)
            .with_transmission(Transmission::Probability(0.0125))
            .with_simulation_days(20)
            .with_n_simulations(4);
        config.seed = seed;
        StochasticEngine::from_configuration(config)
            .with_execution_mode(ExecutionMode::Sequential)
            .into()
    }

    fn observations(engine: &PyStochasticEngine) -> Vec<PyObservation> {
        let result = engine.inner().run().unwrap();
        [5usize, 10, 20]
            .into_iter()
            .map(|day| {
                let value = result.mean.infected[day];
                PyObservation::new(day as u32, "infected".into(), value, 1.0)
            })
            .collect()
    }

    #[test]
    fn test_error_mapping() {
        Python::with_gil(|py| {
            let missing_seed = calibration_err(CalibrationError::MissingSeed);
            assert!(missing_seed.is_instance_of::<PyValueError>(py));
            let unknown_loss = calibration_err(CalibrationError::UnknownLoss("huber".into()));
            assert!(unknown_loss.is_instance_of::<PyValueError>(py));
            let diverged = calibration_err(CalibrationError::Optimizer("diverged".into()));
            assert!(diverged.is_instance_of::<PyRuntimeError>(py));
            let cancelled = CalibrationError::Simulation(SimulationError::Cancelled {
                completed: 1,
                requested: 4,
            });
            assert!(calibration_err(cancelled).is_instance_of::<PyRuntimeError>(py));
        });
    }

    #[test]
    fn test_optimizer_defaults_and_json() {
        let optimizer = PyOptimizer::nelder_mead(Some(50), None, None, None, None, None, false);
        match &optimizer.inner {
            OptimizationConfig::NelderMead(config) => {
                assert_eq!(config.max_iterations, 50);
                assert_eq!(config.sd_tolerance, NelderMeadConfig::default().sd_tolerance);
            }
            other => panic!("unexpected optimizer {other:?}"),
        }

        let swarm = PyOptimizer::particle_swarm(None, None, Some(0.5), None, None, None, true);
        assert!(swarm.verbose());
        let parsed = PyOptimizer::from_json(&swarm.to_json().unwrap()).unwrap();
        assert_eq!(parsed.inner, swarm.inner);

        Python::with_gil(|py| {
            let err = PyOptimizer::from_json(r#"{"simulated_annealing": {}}"#)
                .err()
                .unwrap();
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }

    #[test]
    fn test_parameter_starts_mid_bounds() {
        let parameter = PyParameter::new("coverage".into(), (0.2, 0.6), None);
        assert_eq!(parameter.bounds(), (0.2, 0.6));
        assert!((parameter.initial_value() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_calibrate_recovers_the_generating_value() {
        Python::with_gil(|py| {
            let engine = engine(Some(4242));
            let observed = observations(&engine);
            let parameters = vec![PyParameter::new(
                "transmission_prob".into(),
                (0.0, 0.05),
                Some(0.0125),
            )];
            let optimizer = PyOptimizer::nelder_mead(Some(5), None, None, None, None, None, false);

            let result =
                calibrate(py, &engine, observed, parameters, "sse", Some(optimizer)).unwrap();

            assert_eq!(result.final_loss(), 0.0);
            assert!(result.iterations() <= 5);
            assert!(result.best_parameters().contains_key("transmission_prob"));
        });
    }

    #[test]
    fn test_calibrate_rejects_bad_input() {
        Python::with_gil(|py| {
            let seeded = engine(Some(7));
            let observed = observations(&seeded);
            let parameters = vec![PyParameter::new("r0".into(), (0.5, 4.0), None)];

            let err = calibrate(py, &seeded, observed.clone(), parameters.clone(), "huber", None)
                .err()
                .unwrap();
            assert!(err.is_instance_of::<PyValueError>(py));

            let unseeded = engine(None);
            let err = calibrate(py, &unseeded, observed, parameters, "sse", None)
                .err()
                .unwrap();
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }
}
