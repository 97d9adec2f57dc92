//! Type definitions for calibration

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// An observed surveillance count to fit against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedDataPoint {
    /// Simulated day the observation refers to (day 0 is the index case)
    pub day: u32,

    /// Trajectory being observed: `infected`, `hospitalized`, `tested` or `recovered`
    pub series: String,

    /// Observed cumulative count
    pub value: f64,

    /// Weight used by [`LossConfig::WeightedSSE`] (default 1.0)
    pub weight: f64,
}

impl ObservedDataPoint {
    pub fn new(day: u32, series: impl Into<String>, value: f64) -> Self {
        Self {
            day,
            series: series.into(),
            value,
            weight: 1.0,
        }
    }

    pub fn with_weight(day: u32, series: impl Into<String>, value: f64, weight: f64) -> Self {
        Self {
            day,
            series: series.into(),
            value,
            weight,
        }
    }
}

/// Engine parameter to calibrate, with its search bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParameter {
    /// Parameter identifier understood by the engine (e.g. `r0`, `coverage`)
    pub id: String,

    pub min_bound: f64,
    pub max_bound: f64,

    /// Starting point; the midpoint of the bounds when absent
    pub initial_guess: Option<f64>,
}

impl CalibrationParameter {
    pub fn new(id: impl Into<String>, min_bound: f64, max_bound: f64) -> Self {
        Self {
            id: id.into(),
            min_bound,
            max_bound,
            initial_guess: None,
        }
    }

    pub fn with_initial_guess(
        id: impl Into<String>,
        min_bound: f64,
        max_bound: f64,
        initial_guess: f64,
    ) -> Self {
        Self {
            id: id.into(),
            min_bound,
            max_bound,
            initial_guess: Some(initial_guess),
        }
    }

    pub fn initial_value(&self) -> f64 {
        self.initial_guess
            .unwrap_or_else(|| (self.min_bound + self.max_bound) / 2.0)
    }

    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min_bound && value <= self.max_bound
    }

    pub(crate) fn has_valid_bounds(&self) -> bool {
        self.min_bound.is_finite() && self.max_bound.is_finite() && self.min_bound <= self.max_bound
    }
}

/// Loss between observed values and the ensemble's mean trajectory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossConfig {
    /// Σ(observed - predicted)²
    #[default]
    SumSquaredError,

    /// √(Σ(observed - predicted)² / n)
    RootMeanSquaredError,

    /// Σ|observed - predicted| / n
    MeanAbsoluteError,

    /// Σ weight·(observed - predicted)²
    #[serde(rename = "weighted_sse")]
    WeightedSSE,
}

impl LossConfig {
    /// Reduce `(observed, predicted, weight)` triples to a single loss value
    pub fn evaluate<I>(&self, residuals: I) -> f64
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        let mut total = 0.0;
        let mut count = 0usize;
        for (observed, predicted, weight) in residuals {
            let error = observed - predicted;
            total += match self {
                LossConfig::SumSquaredError | LossConfig::RootMeanSquaredError => error * error,
                LossConfig::MeanAbsoluteError => error.abs(),
                LossConfig::WeightedSSE => weight * error * error,
            };
            count += 1;
        }

        match self {
            LossConfig::SumSquaredError | LossConfig::WeightedSSE => total,
            _ if count == 0 => 0.0,
            LossConfig::RootMeanSquaredError => (total / count as f64).sqrt(),
            LossConfig::MeanAbsoluteError => total / count as f64,
        }
    }
}

impl fmt::Display for LossConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossConfig::SumSquaredError => write!(f, "Sum Squared Error"),
            LossConfig::RootMeanSquaredError => write!(f, "Root Mean Squared Error"),
            LossConfig::MeanAbsoluteError => write!(f, "Mean Absolute Error"),
            LossConfig::WeightedSSE => write!(f, "Weighted Sum Squared Error"),
        }
    }
}

/// Accepts the serialized names and the usual abbreviations (`sse`, `rmse`, `mae`)
impl FromStr for LossConfig {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sse" | "sum_squared_error" => Ok(LossConfig::SumSquaredError),
            "rmse" | "root_mean_squared_error" => Ok(LossConfig::RootMeanSquaredError),
            "mae" | "mean_absolute_error" => Ok(LossConfig::MeanAbsoluteError),
            "weighted_sse" => Ok(LossConfig::WeightedSSE),
            _ => Err(CalibrationError::UnknownLoss(s.to_string())),
        }
    }
}

/// Result from a calibration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Best parameter values found, in the order the parameters were given
    pub best_parameters: Vec<f64>,

    pub parameter_names: Vec<String>,

    pub final_loss: f64,

    pub iterations: usize,

    pub converged: bool,

    pub termination_reason: String,
}

impl CalibrationResult {
    pub fn parameters_map(&self) -> HashMap<String, f64> {
        self.parameter_names
            .iter()
            .cloned()
            .zip(self.best_parameters.iter().copied())
            .collect()
    }
}
