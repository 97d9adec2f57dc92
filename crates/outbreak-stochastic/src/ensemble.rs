//! Ensemble execution.
//!
//! An ensemble is a queue of [`TrialTask`]s, one per trial, sharing a validated
//! configuration and its hazard curves. Tasks run either sequentially or on the rayon
//! pool; each task owns a random stream derived from `(base_seed, trial_index)`, so both
//! modes produce identical results for the same seed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use outbreak_core::{
    Configuration, EnsembleResult, HazardCurves, SimulationError, SimulationResult, TrialState,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::rng::{resolve_base_seed, trial_rng};
use crate::transition::TransitionEngine;
use crate::trial::Trial;

/// How the trial queue is executed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One trial after another on the calling thread
    Sequential,
    /// Trials spread over the rayon thread pool
    #[default]
    Parallel,
}

/// Cooperative cancellation flag, checked before each trial starts
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A single queued trial
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialTask {
    pub trial_index: usize,
    pub base_seed: u64,
}

impl TrialTask {
    pub fn run(
        &self,
        engine: &TransitionEngine<'_>,
        simulation_days: u32,
    ) -> SimulationResult<TrialState> {
        let mut rng = trial_rng(self.base_seed, self.trial_index);
        let state = Trial::new(engine, simulation_days).run(&mut rng)?;
        debug!(
            trial = self.trial_index,
            infected = state.last().infected,
            tested = state.last().tested,
            "trial complete"
        );
        Ok(state)
    }
}

/// Runs `n_simulations` independent trials and aggregates them
#[derive(Clone, Debug)]
pub struct EnsembleRunner<'a> {
    config: &'a Configuration,
    mode: ExecutionMode,
    cancellation: Option<CancellationToken>,
}

impl<'a> EnsembleRunner<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            config,
            mode: ExecutionMode::default(),
            cancellation: None,
        }
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Tasks for every trial, in trial-index order
    pub fn tasks(&self, base_seed: u64) -> Vec<TrialTask> {
        (0..self.config.n_simulations as usize)
            .map(|trial_index| TrialTask {
                trial_index,
                base_seed,
            })
            .collect()
    }

    /// Validate the configuration, run every trial and aggregate.
    ///
    /// Either all trials complete or the first error is returned; no partial result is
    /// produced.
    pub fn run(&self) -> SimulationResult<EnsembleResult> {
        let config = self.config;
        config.validate()?;
        let hazards = HazardCurves::from_configuration(config)?;
        let engine = TransitionEngine::new(config, &hazards);

        let base_seed = resolve_base_seed(config.seed);
        let tasks = self.tasks(base_seed);
        let requested = tasks.len();
        let completed = AtomicUsize::new(0);

        info!(
            trials = requested,
            days = config.simulation_days,
            population = config.population,
            transmission_prob = config.transmission_prob(),
            mode = ?self.mode,
            seeded = config.seed.is_some(),
            "ensemble starting"
        );

        let execute = |task: &TrialTask| -> SimulationResult<TrialState> {
            if self.is_cancelled() {
                return Err(SimulationError::Cancelled {
                    completed: completed.load(Ordering::Relaxed),
                    requested,
                });
            }
            let state = task.run(&engine, config.simulation_days)?;
            completed.fetch_add(1, Ordering::Relaxed);
            Ok(state)
        };

        let trials: Vec<TrialState> = match self.mode {
            ExecutionMode::Sequential => tasks.iter().map(execute).collect::<Result<_, _>>()?,
            ExecutionMode::Parallel => tasks.par_iter().map(execute).collect::<Result<_, _>>()?,
        };

        let result = EnsembleResult::from_trials(trials, config);
        info!(
            mean_first_detection_day = result.first_detection.mean,
            detected_trials = result.first_detection.detected_trials,
            mean_final_infected = result.mean.infected.last().copied().unwrap_or_default(),
            "ensemble complete"
        );
        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Run an ensemble for `config` on the rayon pool
pub fn run_ensemble(config: &Configuration) -> SimulationResult<EnsembleResult> {
    EnsembleRunner::new(config).run()
}
