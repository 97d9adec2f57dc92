//! Python bindings for outbreak-core types.

use outbreak_core::{
    Configuration, ContactMode, DetectionSummary, DiseasePreset, EnsembleResult, Series,
    TestingMode, Transmission, DISEASE_PRESETS,
};
use pyo3::exceptions::{PyIndexError, PyValueError};
use pyo3::prelude::*;

use crate::simulation_err;

fn parse_series(name: &str) -> PyResult<Series> {
    name.parse::<Series>().map_err(simulation_err)
}

/// Wrapper for outbreak_core::Configuration
#[pyclass(name = "Configuration")]
#[derive(Clone)]
pub struct PyConfiguration {
    pub inner: Configuration,
}

#[pymethods]
impl PyConfiguration {
    /// Create a configuration; omitted arguments keep their defaults.
    ///
    /// Pass at most one of `r0` and `transmission_prob`. `testing_mode` is `"shared_draw"`
    /// or `"independent_draws"`, `contact_mode` is `"fixed"` or `"per_infectious"`.
    #[new]
    #[pyo3(signature = (
        population=None,
        r0=None,
        transmission_prob=None,
        incubation_period=None,
        infectious_period=None,
        daily_contacts=None,
        coverage=None,
        testing_proportion=None,
        sensitivity=None,
        simulation_days=None,
        n_simulations=None,
        seed=None,
        detection_threshold=None,
        testing_mode=None,
        contact_mode=None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        population: Option<u64>,
        r0: Option<f64>,
        transmission_prob: Option<f64>,
        incubation_period: Option<f64>,
        infectious_period: Option<f64>,
        daily_contacts: Option<u32>,
        coverage: Option<f64>,
        testing_proportion: Option<f64>,
        sensitivity: Option<f64>,
        simulation_days: Option<u32>,
        n_simulations: Option<u32>,
        seed: Option<u64>,
        detection_threshold: Option<u64>,
        testing_mode: Option<&str>,
        contact_mode: Option<&str>,
    ) -> PyResult<Self> {
        let mut config = Configuration::default();
        match (r0, transmission_prob) {
            (Some(_), Some(_)) => {
                return Err(PyValueError::new_err(
                    "pass either r0 or transmission_prob, not both",
                ))
            }
            (Some(r0), None) => config.transmission = Transmission::R0(r0),
            (None, Some(p)) => config.transmission = Transmission::Probability(p),
            (None, None) => {}
        }
        if let Some(v) = population {
            config.population = v;
        }
        if let Some(v) = incubation_period {
            config.incubation_period = v;
        }
        if let Some(v) = infectious_period {
            config.infectious_period = v;
        }
        if let Some(v) = daily_contacts {
            config.daily_contacts = v;
        }
        if let Some(v) = coverage {
            config.coverage = v;
        }
        if let Some(v) = testing_proportion {
            config.testing_proportion = v;
        }
        if let Some(v) = sensitivity {
            config.sensitivity = v;
        }
        if let Some(v) = simulation_days {
            config.simulation_days = v;
        }
        if let Some(v) = n_simulations {
            config.n_simulations = v;
        }
        if let Some(v) = detection_threshold {
            config.detection_threshold = v;
        }
        config.seed = seed;
        if let Some(mode) = testing_mode {
            config.testing_mode = match mode {
                "shared_draw" => TestingMode::SharedDraw,
                "independent_draws" => TestingMode::IndependentDraws,
                other => {
                    return Err(PyValueError::new_err(format!(
                        "unknown testing mode '{other}'"
                    )))
                }
            };
        }
        if let Some(mode) = contact_mode {
            config.contact_mode = match mode {
                "fixed" => ContactMode::Fixed,
                "per_infectious" => ContactMode::PerInfectious,
                other => {
                    return Err(PyValueError::new_err(format!(
                        "unknown contact mode '{other}'"
                    )))
                }
            };
        }
        Ok(Self { inner: config })
    }

    /// Default configuration for a named disease preset
    #[staticmethod]
    fn from_preset(name: &str) -> PyResult<Self> {
        let preset = DiseasePreset::find(name)
            .ok_or_else(|| PyValueError::new_err(format!("unknown disease preset '{name}'")))?;
        Ok(Self {
            inner: Configuration::from_preset(preset),
        })
    }

    #[staticmethod]
    fn from_json_file(path: String) -> PyResult<Self> {
        let inner = Configuration::from_json_file(path).map_err(simulation_err)?;
        Ok(Self { inner })
    }

    #[staticmethod]
    fn from_json(json_str: String) -> PyResult<Self> {
        let inner = Configuration::from_json(&json_str).map_err(simulation_err)?;
        Ok(Self { inner })
    }

    fn to_json_file(&self, path: String) -> PyResult<()> {
        self.inner.to_json_file(path).map_err(simulation_err)
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(simulation_err)
    }

    /// Raise ValueError if any field is out of range
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(simulation_err)
    }

    fn parameter(&self, parameter_id: &str) -> PyResult<f64> {
        self.inner.parameter(parameter_id).map_err(simulation_err)
    }

    fn set_parameter(&mut self, parameter_id: &str, value: f64) -> PyResult<()> {
        self.inner
            .set_parameter(parameter_id, value)
            .map_err(simulation_err)
    }

    #[getter]
    fn population(&self) -> u64 {
        self.inner.population
    }

    #[getter]
    fn r0(&self) -> f64 {
        self.inner.r0()
    }

    #[getter]
    fn transmission_prob(&self) -> f64 {
        self.inner.transmission_prob()
    }

    #[getter]
    fn median_hospitalisation_time(&self) -> f64 {
        self.inner.median_hospitalisation_time()
    }

    #[getter]
    fn simulation_days(&self) -> u32 {
        self.inner.simulation_days
    }

    #[getter]
    fn n_simulations(&self) -> u32 {
        self.inner.n_simulations
    }

    #[getter]
    fn seed(&self) -> Option<u64> {
        self.inner.seed
    }

    fn __repr__(&self) -> String {
        format!(
            "Configuration(population={}, r0={:.3}, transmission_prob={:.5}, days={}, trials={})",
            self.inner.population,
            self.inner.r0(),
            self.inner.transmission_prob(),
            self.inner.simulation_days,
            self.inner.n_simulations
        )
    }
}

/// Wrapper for outbreak_core::DiseasePreset
#[pyclass(name = "DiseasePreset", frozen)]
#[derive(Clone)]
pub struct PyDiseasePreset {
    inner: DiseasePreset,
}

#[pymethods]
impl PyDiseasePreset {
    #[getter]
    fn name(&self) -> &'static str {
        self.inner.name
    }

    #[getter]
    fn transmission_rate(&self) -> f64 {
        self.inner.transmission_rate
    }

    #[getter]
    fn incubation_period(&self) -> f64 {
        self.inner.incubation_period
    }

    #[getter]
    fn infectious_period(&self) -> f64 {
        self.inner.infectious_period
    }

    #[getter]
    fn r0(&self) -> f64 {
        self.inner.r0()
    }

    fn __repr__(&self) -> String {
        format!("DiseasePreset(name='{}', r0={:.2})", self.inner.name, self.inner.r0())
    }
}

/// Built-in disease presets
#[pyfunction]
fn disease_presets() -> Vec<PyDiseasePreset> {
    DISEASE_PRESETS
        .iter()
        .map(|preset| PyDiseasePreset { inner: *preset })
        .collect()
}

/// Wrapper for outbreak_core::EnsembleResult
#[pyclass(name = "EnsembleResult", frozen)]
pub struct PyEnsembleResult {
    pub inner: EnsembleResult,
}

impl PyEnsembleResult {
    fn detection(&self, milestone: &str) -> PyResult<&DetectionSummary> {
        match milestone {
            "first" => Ok(&self.inner.first_detection),
            "tenth" => Ok(&self.inner.tenth_detection),
            other => Err(PyValueError::new_err(format!(
                "unknown detection milestone '{other}' (expected 'first' or 'tenth')"
            ))),
        }
    }
}

#[pymethods]
impl PyEnsembleResult {
    #[getter]
    fn simulation_days(&self) -> u32 {
        self.inner.simulation_days
    }

    #[getter]
    fn n_trials(&self) -> usize {
        self.inner.n_trials()
    }

    /// Mean trajectory of `series` across trials (length simulation_days + 1)
    fn mean(&self, series: &str) -> PyResult<Vec<f64>> {
        Ok(self.inner.mean.series(parse_series(series)?).to_vec())
    }

    /// Trajectory of `series` for every trial
    fn trials(&self, series: &str) -> PyResult<Vec<Vec<u64>>> {
        let series = parse_series(series)?;
        Ok(self
            .inner
            .trials
            .iter()
            .map(|trial| trial.series(series).to_vec())
            .collect())
    }

    fn trial(&self, index: usize, series: &str) -> PyResult<Vec<u64>> {
        let series = parse_series(series)?;
        self.inner
            .trials
            .get(index)
            .map(|trial| trial.series(series).to_vec())
            .ok_or_else(|| PyIndexError::new_err(format!("no trial {index}")))
    }

    /// Day each trial went extinct, or None if it was still active at the end
    #[getter]
    fn extinction_days(&self) -> Vec<Option<u32>> {
        self.inner.trials.iter().map(|t| t.extinction_day).collect()
    }

    /// Per-trial detection days; undetected trials report simulation_days
    #[pyo3(signature = (milestone="first"))]
    fn detection_days(&self, milestone: &str) -> PyResult<Vec<u32>> {
        Ok(self.detection(milestone)?.days.clone())
    }

    #[pyo3(signature = (milestone="first"))]
    fn mean_detection_day(&self, milestone: &str) -> PyResult<f64> {
        Ok(self.detection(milestone)?.mean)
    }

    /// 95% confidence interval of the mean detection day
    #[pyo3(signature = (milestone="first"))]
    fn detection_confidence_interval(&self, milestone: &str) -> PyResult<(f64, f64)> {
        Ok(self.detection(milestone)?.confidence_interval)
    }

    #[pyo3(signature = (milestone="first"))]
    fn detection_rate(&self, milestone: &str) -> PyResult<f64> {
        Ok(self.detection(milestone)?.detection_rate())
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(simulation_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "EnsembleResult(trials={}, days={}, mean_first_detection_day={:.2})",
            self.inner.n_trials(),
            self.inner.simulation_days,
            self.inner.mean_first_detection_day()
        )
    }
}

pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyConfiguration>()?;
    m.add_class::<PyDiseasePreset>()?;
    m.add_class::<PyEnsembleResult>()?;
    m.add_function(wrap_pyfunction!(disease_presets, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outbreak_core::SimulationEngine;
    use outbreak_stochastic::{ExecutionMode, StochasticEngine};

    fn configuration(
        r0: Option<f64>,
        transmission_prob: Option<f64>,
        testing_mode: Option<&str>,
        contact_mode: Option<&str>,
    ) -> PyResult<PyConfiguration> {
        PyConfiguration::new(
            Some(10_000),
            r0,
            transmission_prob,
            None,
            None,
            None,
            None,
            None,
            None,
            Some(25),
            Some(3),
            Some(11),
            None,
            testing_mode,
            contact_mode,
        )
    }

    fn ensemble() -> PyEnsembleResult {
        let config = configuration(None, Some(0.02), None, None).unwrap().inner;
        let inner = StochasticEngine::from_configuration(config)
            .with_execution_mode(ExecutionMode::Sequential)
            .run()
            .unwrap();
        PyEnsembleResult { inner }
    }

    #[test]
    fn test_keyword_arguments_override_defaults() {
        let config = configuration(Some(2.5), None, None, None).unwrap().inner;
        assert_eq!(config.transmission, Transmission::R0(2.5));
        assert_eq!(config.population, 10_000);
        assert_eq!(config.simulation_days, 25);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.coverage, Configuration::default().coverage);

        let config = configuration(None, Some(0.01), None, None).unwrap().inner;
        assert_eq!(config.transmission, Transmission::Probability(0.01));
    }

    #[test]
    fn test_modes_are_parsed_by_name() {
        let config = configuration(None, None, Some("independent_draws"), Some("per_infectious"))
            .unwrap()
            .inner;
        assert_eq!(config.testing_mode, TestingMode::IndependentDraws);
        assert_eq!(config.contact_mode, ContactMode::PerInfectious);

        let config = configuration(None, None, Some("shared_draw"), Some("fixed"))
            .unwrap()
            .inner;
        assert_eq!(config.testing_mode, TestingMode::SharedDraw);
        assert_eq!(config.contact_mode, ContactMode::Fixed);
    }

    #[test]
    fn test_conflicting_or_unknown_arguments_raise_value_error() {
        Python::with_gil(|py| {
            for result in [
                configuration(Some(2.0), Some(0.01), None, None),
                configuration(None, None, Some("every_other_day"), None),
                configuration(None, None, None, Some("household")),
            ] {
                let err = result.err().unwrap();
                assert!(err.is_instance_of::<PyValueError>(py));
            }
        });
    }

    #[test]
    fn test_detection_milestones() {
        let result = ensemble();
        assert!(std::ptr::eq(
            result.detection("first").unwrap(),
            &result.inner.first_detection
        ));
        assert!(std::ptr::eq(
            result.detection("tenth").unwrap(),
            &result.inner.tenth_detection
        ));
        assert_eq!(
            result.detection_days("first").unwrap(),
            result.inner.first_detection.days
        );

        Python::with_gil(|py| {
            let err = result.detection("second").err().unwrap();
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }

    #[test]
    fn test_series_lookup_errors() {
        let result = ensemble();
        assert_eq!(result.mean("infected").unwrap().len(), 26);
        assert_eq!(result.trials("tested").unwrap().len(), 3);

        Python::with_gil(|py| {
            let err = result.mean("deceased").err().unwrap();
            assert!(err.is_instance_of::<PyValueError>(py));
            let err = result.trial(3, "infected").err().unwrap();
            assert!(err.is_instance_of::<PyIndexError>(py));
        });
    }
}
