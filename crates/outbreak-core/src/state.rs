//! Trial trajectories and ensemble results

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::error::SimulationError;
use crate::stats;

/// Milestone reported next to first detection
pub const TENTH_DETECTION_THRESHOLD: u64 = 10;

/// Cumulative counters for a single day
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounters {
    pub infected: u64,
    pub hospitalized: u64,
    pub tested: u64,
    pub recovered: u64,
}

impl DailyCounters {
    /// Day-zero counters: one index case
    pub fn index_case() -> Self {
        Self {
            infected: 1,
            ..Self::default()
        }
    }
}

/// One of the four trajectories tracked per trial
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    Infected,
    Hospitalized,
    Tested,
    Recovered,
}

impl Series {
    pub const ALL: [Series; 4] = [
        Series::Infected,
        Series::Hospitalized,
        Series::Tested,
        Series::Recovered,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Series::Infected => "infected",
            Series::Hospitalized => "hospitalized",
            Series::Tested => "tested",
            Series::Recovered => "recovered",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Series {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Series::ALL
            .into_iter()
            .find(|series| series.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SimulationError::InvalidParameter {
                name: "series".to_string(),
                value: f64::NAN,
                reason: format!(
                    "unknown series '{s}' (available: infected, hospitalized, tested, recovered)"
                ),
            })
    }
}

/// Day-indexed cumulative counters of one trial.
///
/// Every sequence has the same length and is nondecreasing. Once a trial completes the
/// state is only read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialState {
    pub infected: Vec<u64>,
    pub hospitalized: Vec<u64>,
    pub tested: Vec<u64>,
    pub recovered: Vec<u64>,

    /// Day on which the last active case resolved, if that happened before the final day.
    /// A trial whose last case resolves on day `simulation_days` reports `None`.
    pub extinction_day: Option<u32>,
}

impl TrialState {
    /// Fresh state holding day zero, with room for `simulation_days + 1` entries
    pub fn new(simulation_days: u32) -> Self {
        let capacity = simulation_days as usize + 1;
        let mut state = Self {
            infected: Vec::with_capacity(capacity),
            hospitalized: Vec::with_capacity(capacity),
            tested: Vec::with_capacity(capacity),
            recovered: Vec::with_capacity(capacity),
            extinction_day: None,
        };
        state.push(DailyCounters::index_case());
        state
    }

    /// Number of recorded days, including day zero
    pub fn len(&self) -> usize {
        self.infected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infected.is_empty()
    }

    pub fn push(&mut self, counters: DailyCounters) {
        self.infected.push(counters.infected);
        self.hospitalized.push(counters.hospitalized);
        self.tested.push(counters.tested);
        self.recovered.push(counters.recovered);
    }

    pub fn day(&self, day: usize) -> Option<DailyCounters> {
        Some(DailyCounters {
            infected: *self.infected.get(day)?,
            hospitalized: *self.hospitalized.get(day)?,
            tested: *self.tested.get(day)?,
            recovered: *self.recovered.get(day)?,
        })
    }

    pub fn last(&self) -> DailyCounters {
        self.len()
            .checked_sub(1)
            .and_then(|day| self.day(day))
            .unwrap_or_default()
    }

    /// Repeat the last counters until the state covers `0..=simulation_days`
    pub fn forward_fill(&mut self, simulation_days: u32) {
        let last = self.last();
        while self.len() < simulation_days as usize + 1 {
            self.push(last);
        }
    }

    pub fn series(&self, series: Series) -> &[u64] {
        match series {
            Series::Infected => &self.infected,
            Series::Hospitalized => &self.hospitalized,
            Series::Tested => &self.tested,
            Series::Recovered => &self.recovered,
        }
    }

    /// First day on which the cumulative tested-positive count reaches `threshold`
    pub fn detection_day(&self, threshold: u64) -> Option<u32> {
        self.tested
            .iter()
            .position(|&tested| tested >= threshold)
            .map(|day| day as u32)
    }

    /// Check the trajectory invariants for a population of size `population`
    pub fn is_consistent(&self, population: u64) -> bool {
        let len = self.len();
        let same_length = self.hospitalized.len() == len
            && self.tested.len() == len
            && self.recovered.len() == len;
        if !same_length {
            return false;
        }

        let nondecreasing = Series::ALL
            .iter()
            .all(|&series| self.series(series).windows(2).all(|w| w[0] <= w[1]));

        let bounded = (0..len).all(|d| {
            self.infected[d] <= population
                && self.hospitalized[d] + self.recovered[d] <= self.infected[d]
                && self.tested[d] <= self.hospitalized[d]
        });

        nondecreasing && bounded
    }
}

/// Elementwise mean of every trajectory across the ensemble
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanTrajectories {
    pub infected: Vec<f64>,
    pub hospitalized: Vec<f64>,
    pub tested: Vec<f64>,
    pub recovered: Vec<f64>,
}

impl MeanTrajectories {
    pub fn from_trials(trials: &[TrialState], simulation_days: u32) -> Self {
        let len = simulation_days as usize + 1;
        let mean_of = |series: Series| {
            stats::elementwise_mean(trials.iter().map(|trial| trial.series(series)), len)
        };
        Self {
            infected: mean_of(Series::Infected),
            hospitalized: mean_of(Series::Hospitalized),
            tested: mean_of(Series::Tested),
            recovered: mean_of(Series::Recovered),
        }
    }

    pub fn series(&self, series: Series) -> &[f64] {
        match series {
            Series::Infected => &self.infected,
            Series::Hospitalized => &self.hospitalized,
            Series::Tested => &self.tested,
            Series::Recovered => &self.recovered,
        }
    }
}

/// Distribution of the detection day across trials
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Cumulative tested-positive count that counts as detection
    pub threshold: u64,

    /// Per-trial detection day; trials that never detect carry the sentinel `simulation_days`
    pub days: Vec<u32>,

    pub mean: f64,

    /// 95% confidence interval of the mean
    pub confidence_interval: (f64, f64),

    /// Number of trials that reached the threshold within the simulated window
    pub detected_trials: usize,

    pub earliest: u32,
    pub latest: u32,
}

impl DetectionSummary {
    pub fn from_trials(trials: &[TrialState], threshold: u64, simulation_days: u32) -> Self {
        let mut detected_trials = 0;
        let days: Vec<u32> = trials
            .iter()
            .map(|trial| match trial.detection_day(threshold) {
                Some(day) => {
                    detected_trials += 1;
                    day
                }
                None => simulation_days,
            })
            .collect();

        let as_f64: Vec<f64> = days.iter().map(|&d| d as f64).collect();

        Self {
            threshold,
            mean: stats::mean(&as_f64),
            confidence_interval: stats::confidence_interval_95(&as_f64),
            detected_trials,
            earliest: days.iter().copied().min().unwrap_or(simulation_days),
            latest: days.iter().copied().max().unwrap_or(simulation_days),
            days,
        }
    }

    /// Share of trials that detected the outbreak within the window
    pub fn detection_rate(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        self.detected_trials as f64 / self.days.len() as f64
    }
}

/// Output of one ensemble run, consumed by the rendering layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub simulation_days: u32,

    /// Raw per-trial trajectories, in trial-index order
    pub trials: Vec<TrialState>,

    pub mean: MeanTrajectories,

    /// Detection at the configured threshold (first positive by default)
    pub first_detection: DetectionSummary,

    /// Detection of the tenth positive
    pub tenth_detection: DetectionSummary,
}

impl EnsembleResult {
    pub fn from_trials(trials: Vec<TrialState>, config: &Configuration) -> Self {
        let days = config.simulation_days;
        Self {
            simulation_days: days,
            mean: MeanTrajectories::from_trials(&trials, days),
            first_detection: DetectionSummary::from_trials(
                &trials,
                config.detection_threshold,
                days,
            ),
            tenth_detection: DetectionSummary::from_trials(
                &trials,
                TENTH_DETECTION_THRESHOLD,
                days,
            ),
            trials,
        }
    }

    /// Mean first-detection day across trials (sentinel included for undetected trials)
    pub fn mean_first_detection_day(&self) -> f64 {
        self.first_detection.mean
    }

    pub fn n_trials(&self) -> usize {
        self.trials.len()
    }

    pub fn to_json(&self) -> Result<String, SimulationError> {
        Ok(serde_json::to_string(self)?)
    }
}
