use outbreak_core::{SimulationResult, TrialState};
use rand::Rng;
use tracing::debug;

use crate::transition::{ActiveCases, TransitionEngine};

/// One stochastic realisation of the outbreak.
///
/// Starts from a single index case and steps day by day until `simulation_days` is
/// reached or the active-case set empties. After extinction no infection is possible, so
/// the remaining days repeat the last counters.
pub struct Trial<'a> {
    engine: &'a TransitionEngine<'a>,
    simulation_days: u32,
    state: TrialState,
    active: ActiveCases,
}

impl<'a> Trial<'a> {
    pub fn new(engine: &'a TransitionEngine<'a>, simulation_days: u32) -> Self {
        Self {
            engine,
            simulation_days,
            state: TrialState::new(simulation_days),
            active: ActiveCases::index_case(),
        }
    }

    /// Run the day loop to completion and return the frozen trajectory
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> SimulationResult<TrialState> {
        for day in 0..self.simulation_days {
            let (next, _) = self
                .engine
                .step(day, &mut self.active, self.state.last(), rng)?;
            self.state.push(next);

            // Resolving on the final step leaves no days to freeze
            let extinct_on = day + 1;
            if self.active.is_empty() && extinct_on < self.simulation_days {
                debug!(day = extinct_on, "outbreak extinct");
                self.state.extinction_day = Some(extinct_on);
                self.state.forward_fill(self.simulation_days);
                break;
            }
        }

        debug_assert!(self.state.is_consistent(self.engine.population()));
        Ok(self.state)
    }
}
