//! Calibration problem definition and implementation

use argmin::core::{CostFunction, Error};
use outbreak_core::{MeanTrajectories, Series, SimulationEngine};
use tracing::debug;

use crate::error::{CalibrationError, CalibrationOutcome};
use crate::types::{CalibrationParameter, LossConfig, ObservedDataPoint};

/// Fits named engine parameters so the ensemble's mean trajectories match observations.
///
/// Works with any [`SimulationEngine`]. The template engine must carry a fixed seed: every
/// evaluation then replays the same random streams, which turns the stochastic ensemble
/// into a deterministic objective the optimizers can compare.
///
/// ```rust,ignore
/// use outbreak_calibration::{CalibrationProblem, CalibrationParameter, LossConfig, ObservedDataPoint};
/// use outbreak_stochastic::StochasticEngine;
///
/// let engine = StochasticEngine::from_configuration(config.with_seed(42));
/// let observed = vec![
///     ObservedDataPoint::new(21, "tested", 3.0),
///     ObservedDataPoint::new(42, "tested", 57.0),
/// ];
/// let params = vec![CalibrationParameter::new("r0", 1.0, 4.0)];
///
/// let problem = CalibrationProblem::new(engine, observed, params, LossConfig::SumSquaredError)?;
/// ```
pub struct CalibrationProblem<E: SimulationEngine> {
    /// Cloned for each evaluation
    template_engine: E,

    observed_data: Vec<ObservedDataPoint>,

    /// Parsed series of each observation, same order as `observed_data`
    observed_series: Vec<Series>,

    calibration_params: Vec<CalibrationParameter>,

    loss_config: LossConfig,
}

impl<E: SimulationEngine> CalibrationProblem<E> {
    /// Create a new calibration problem.
    ///
    /// Fails when there is nothing to fit, when an observation names an unknown series or
    /// lies past the simulated window, when a parameter is unknown to the engine or has
    /// invalid bounds, or when the engine has no fixed seed.
    pub fn new(
        template_engine: E,
        observed_data: Vec<ObservedDataPoint>,
        calibration_params: Vec<CalibrationParameter>,
        loss_config: LossConfig,
    ) -> CalibrationOutcome<Self> {
        if observed_data.is_empty() {
            return Err(CalibrationError::NoObservations);
        }
        if calibration_params.is_empty() {
            return Err(CalibrationError::NoParameters);
        }

        let config = template_engine.configuration();
        if config.seed.is_none() {
            return Err(CalibrationError::MissingSeed);
        }

        let simulation_days = config.simulation_days;
        let mut observed_series = Vec::with_capacity(observed_data.len());
        for (index, obs) in observed_data.iter().enumerate() {
            let series = obs.series.parse::<Series>().map_err(|e| {
                CalibrationError::InvalidObservation {
                    index,
                    reason: e.to_string(),
                }
            })?;
            if obs.day > simulation_days {
                return Err(CalibrationError::ObservationOutOfRange {
                    day: obs.day,
                    simulation_days,
                });
            }
            if !obs.value.is_finite() || !obs.weight.is_finite() || obs.weight < 0.0 {
                return Err(CalibrationError::InvalidObservation {
                    index,
                    reason: format!(
                        "value {} and weight {} must be finite, weight non-negative",
                        obs.value, obs.weight
                    ),
                });
            }
            observed_series.push(series);
        }

        for param in &calibration_params {
            template_engine.parameter(&param.id)?;
            if !param.has_valid_bounds() {
                return Err(CalibrationError::InvalidBounds {
                    id: param.id.clone(),
                    min: param.min_bound,
                    max: param.max_bound,
                });
            }
            let initial = param.initial_value();
            if !param.is_within_bounds(initial) {
                return Err(CalibrationError::InitialGuessOutOfBounds {
                    id: param.id.clone(),
                    value: initial,
                    min: param.min_bound,
                    max: param.max_bound,
                });
            }
        }

        Ok(Self {
            template_engine,
            observed_data,
            observed_series,
            calibration_params,
            loss_config,
        })
    }

    pub fn num_parameters(&self) -> usize {
        self.calibration_params.len()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.calibration_params
            .iter()
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn initial_parameters(&self) -> Vec<f64> {
        self.calibration_params
            .iter()
            .map(CalibrationParameter::initial_value)
            .collect()
    }

    /// Parameter bounds as `(min, max)` tuples
    pub fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        self.calibration_params
            .iter()
            .map(|p| (p.min_bound, p.max_bound))
            .collect()
    }

    pub fn loss_config(&self) -> LossConfig {
        self.loss_config
    }

    /// Loss of a set of mean trajectories against the observations
    pub fn loss(&self, mean: &MeanTrajectories) -> f64 {
        let residuals = self
            .observed_data
            .iter()
            .zip(&self.observed_series)
            .filter_map(|(obs, &series)| {
                mean.series(series)
                    .get(obs.day as usize)
                    .map(|&predicted| (obs.value, predicted, obs.weight))
            });
        self.loss_config.evaluate(residuals)
    }

    /// Loss for one candidate parameter vector.
    ///
    /// Out-of-bounds candidates, and candidates the engine rejects as invalid (e.g. an R0
    /// whose derived transmission probability exceeds 1), cost `f64::INFINITY`. Any other
    /// simulation failure is an error.
    pub fn evaluate(&self, params: &[f64]) -> CalibrationOutcome<f64> {
        if params.len() != self.calibration_params.len() {
            return Err(CalibrationError::ParameterCount {
                expected: self.calibration_params.len(),
                actual: params.len(),
            });
        }
        if params
            .iter()
            .zip(&self.calibration_params)
            .any(|(&value, param)| !param.is_within_bounds(value))
        {
            return Ok(f64::INFINITY);
        }

        let mut engine = self.template_engine.clone();
        for (&value, param) in params.iter().zip(&self.calibration_params) {
            match engine.set_parameter(&param.id, value) {
                Ok(()) => {}
                Err(e) if e.is_invalid_parameter() => return Ok(f64::INFINITY),
                Err(e) => return Err(e.into()),
            }
        }

        let result = match engine.run() {
            Ok(result) => result,
            Err(e) if e.is_invalid_parameter() => {
                debug!(?params, error = %e, "infeasible candidate");
                return Ok(f64::INFINITY);
            }
            Err(e) => return Err(e.into()),
        };

        let loss = self.loss(&result.mean);
        debug!(?params, loss, "candidate evaluated");
        Ok(loss)
    }
}

impl<E: SimulationEngine> CostFunction for CalibrationProblem<E> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, Error> {
        self.evaluate(params).map_err(Error::from)
    }
}
