//! # Hazard curves
//!
//! Day-indexed transition probabilities derived once per run from Weibull survival
//! distributions and shared read-only by every trial.
//!
//! - Hospitalisation: shape 2.5 (increasing hazard), scale `median_hospitalisation_time`,
//!   evaluated at days since symptom onset. Zero during incubation.
//! - Recovery: shape 1.5, scale `incubation_period + infectious_period`, evaluated at days
//!   since infection.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Weibull};

use crate::config::Configuration;
use crate::error::{SimulationError, SimulationResult};

pub const HOSPITALISATION_SHAPE: f64 = 2.5;
pub const RECOVERY_SHAPE: f64 = 1.5;

/// Weibull distribution backing `curve`; a non-positive or non-finite scale is a
/// [`SimulationError::NumericDomain`] at day 0
fn weibull(curve: &'static str, shape: f64, scale: f64) -> SimulationResult<Weibull> {
    // statrs accepts an infinite scale, which would flatten the curve to zero
    Weibull::new(shape, scale)
        .ok()
        .filter(|_| scale.is_finite())
        .ok_or(SimulationError::NumericDomain {
            curve,
            day: 0,
            value: scale,
        })
}

/// Precomputed `hosp_prob` and `recovery_prob`, indexed by days since infection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardCurves {
    hosp_prob: Vec<f64>,
    recovery_prob: Vec<f64>,
}

impl HazardCurves {
    /// Build curves covering days `0..=simulation_days`
    pub fn new(
        incubation_period: f64,
        infectious_period: f64,
        simulation_days: u32,
    ) -> SimulationResult<Self> {
        let hospitalisation_scale = incubation_period + infectious_period / 2.0;
        let recovery_scale = incubation_period + infectious_period;

        let hospitalisation = weibull("hosp_prob", HOSPITALISATION_SHAPE, hospitalisation_scale)?;
        let recovery = weibull("recovery_prob", RECOVERY_SHAPE, recovery_scale)?;

        let days = 0..=simulation_days as usize;
        let hosp_prob: Vec<f64> = days
            .clone()
            .map(|day| {
                let since_symptoms = day as f64 - incubation_period;
                if since_symptoms < 0.0 {
                    0.0
                } else {
                    hospitalisation.cdf(since_symptoms)
                }
            })
            .collect();
        let recovery_prob: Vec<f64> = days.map(|day| recovery.cdf(day as f64)).collect();

        check_curve("hosp_prob", &hosp_prob)?;
        check_curve("recovery_prob", &recovery_prob)?;

        Ok(Self {
            hosp_prob,
            recovery_prob,
        })
    }

    pub fn from_configuration(config: &Configuration) -> SimulationResult<Self> {
        Self::new(
            config.incubation_period,
            config.infectious_period,
            config.simulation_days,
        )
    }

    /// Probability of hospitalisation for a case infected `days_since_infection` days ago
    #[inline]
    pub fn hosp_prob(&self, days_since_infection: usize) -> f64 {
        lookup(&self.hosp_prob, days_since_infection)
    }

    /// Probability of recovery for a case infected `days_since_infection` days ago
    #[inline]
    pub fn recovery_prob(&self, days_since_infection: usize) -> f64 {
        lookup(&self.recovery_prob, days_since_infection)
    }

    pub fn hosp_curve(&self) -> &[f64] {
        &self.hosp_prob
    }

    pub fn recovery_curve(&self) -> &[f64] {
        &self.recovery_prob
    }

    /// Number of days covered (`simulation_days + 1`)
    pub fn len(&self) -> usize {
        self.hosp_prob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosp_prob.is_empty()
    }
}

fn check_curve(curve: &'static str, values: &[f64]) -> SimulationResult<()> {
    match values
        .iter()
        .enumerate()
        .find(|(_, value)| !(0.0..=1.0).contains(*value))
    {
        Some((day, &value)) => Err(SimulationError::NumericDomain { curve, day, value }),
        None => Ok(()),
    }
}

/// Value at `day`, holding the last value past the end of the curve
#[inline]
fn lookup(curve: &[f64], day: usize) -> f64 {
    curve
        .get(day)
        .or_else(|| curve.last())
        .copied()
        .unwrap_or(0.0)
}
