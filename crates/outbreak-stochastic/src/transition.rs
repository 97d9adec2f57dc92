//! Per-day transition step.
//!
//! One call to [`TransitionEngine::step`] resolves every active case (recovery first, then
//! hospitalisation), draws the day's new infections, runs surveillance on the new
//! hospitalisations and produces the counters for the next day.

use outbreak_core::{
    Configuration, ContactMode, DailyCounters, HazardCurves, SimulationError, SimulationResult,
};
use rand::Rng;
use rand_distr::{Binomial, Distribution};
use tracing::trace;

use crate::surveillance::SurveillanceModel;

/// Infection start days of the currently infectious individuals.
///
/// Stored densely and rebuilt each day by filtering out resolved cases and appending the
/// day's new infections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveCases {
    start_days: Vec<u32>,
}

impl ActiveCases {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single index case infected on day zero
    pub fn index_case() -> Self {
        Self {
            start_days: vec![0],
        }
    }

    pub fn len(&self) -> usize {
        self.start_days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start_days.is_empty()
    }

    pub fn start_days(&self) -> &[u32] {
        &self.start_days
    }

    fn add(&mut self, count: u64, day: u32) {
        self.start_days
            .extend(std::iter::repeat(day).take(count as usize));
    }
}

/// Changes drawn for a single day
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayOutcome {
    pub new_cases: u64,
    pub new_hospitalizations: u64,
    pub new_recoveries: u64,
    pub new_tested_positive: u64,
    /// Active cases left unresolved before new infections were added
    pub n_infectious: u64,
}

/// Advances a trial by one day. Shared read-only by every trial of an ensemble.
#[derive(Clone, Debug)]
pub struct TransitionEngine<'a> {
    hazards: &'a HazardCurves,
    surveillance: SurveillanceModel,
    population: u64,
    daily_contacts: u64,
    transmission_prob: f64,
    contact_mode: ContactMode,
}

impl<'a> TransitionEngine<'a> {
    /// Build the step for a validated configuration and its hazard curves
    pub fn new(config: &Configuration, hazards: &'a HazardCurves) -> Self {
        Self {
            hazards,
            surveillance: SurveillanceModel::from_configuration(config),
            population: config.population,
            daily_contacts: config.daily_contacts as u64,
            transmission_prob: config.transmission_prob(),
            contact_mode: config.contact_mode,
        }
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    /// Resolve day `day` and return the counters for day `day + 1`.
    ///
    /// `active` is rebuilt in place: resolved cases are dropped and new cases are stamped
    /// with start day `day`.
    pub fn step<R: Rng + ?Sized>(
        &self,
        day: u32,
        active: &mut ActiveCases,
        counters: DailyCounters,
        rng: &mut R,
    ) -> SimulationResult<(DailyCounters, DayOutcome)> {
        let mut outcome = DayOutcome::default();

        let hazards = self.hazards;
        active.start_days.retain(|&start| {
            let days_since_infection = (day - start) as usize;
            if rng.gen::<f64>() < hazards.recovery_prob(days_since_infection) {
                outcome.new_recoveries += 1;
                false
            } else if rng.gen::<f64>() < hazards.hosp_prob(days_since_infection) {
                outcome.new_hospitalizations += 1;
                false
            } else {
                true
            }
        });
        outcome.n_infectious = active.len() as u64;

        let susceptible = self
            .population
            .saturating_sub(counters.infected + counters.recovered + counters.hospitalized);
        outcome.new_cases = self.draw_new_cases(outcome.n_infectious, susceptible, rng)?;

        outcome.new_tested_positive = self.surveillance.test(outcome.new_hospitalizations, rng);

        let next = DailyCounters {
            infected: (counters.infected + outcome.new_cases).min(self.population),
            hospitalized: counters.hospitalized + outcome.new_hospitalizations,
            tested: counters.tested + outcome.new_tested_positive,
            recovered: counters.recovered + outcome.new_recoveries,
        };

        active.add(outcome.new_cases, day);

        trace!(
            day,
            active = active.len(),
            new_cases = outcome.new_cases,
            new_hospitalizations = outcome.new_hospitalizations,
            new_recoveries = outcome.new_recoveries,
            new_tested_positive = outcome.new_tested_positive,
            "day resolved"
        );

        Ok((next, outcome))
    }

    fn draw_new_cases<R: Rng + ?Sized>(
        &self,
        n_infectious: u64,
        susceptible: u64,
        rng: &mut R,
    ) -> SimulationResult<u64> {
        if n_infectious == 0 {
            return Ok(0);
        }

        match self.contact_mode {
            ContactMode::Fixed => {
                let contacts = self.daily_contacts.min(susceptible);
                Ok((0..contacts)
                    .filter(|_| rng.gen::<f64>() < self.transmission_prob)
                    .count() as u64)
            }
            ContactMode::PerInfectious => {
                let contacts = self
                    .daily_contacts
                    .saturating_mul(n_infectious)
                    .min(susceptible);
                if contacts == 0 {
                    return Ok(0);
                }
                let binomial = Binomial::new(contacts, self.transmission_prob).map_err(|e| {
                    SimulationError::InvalidParameter {
                        name: "transmission_prob".to_string(),
                        value: self.transmission_prob,
                        reason: e.to_string(),
                    }
                })?;
                Ok(binomial.sample(rng))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::trial_rng;
    use outbreak_core::Transmission;

    fn config() -> Configuration {
        Configuration::default()
            .with_population(1_000)
            .with_transmission(Transmission::Probability(0.5))
            .with_simulation_days(30)
    }

    #[test]
    fn test_new_cases_are_stamped_with_the_current_day() {
        let config = config().with_incubation_period(20.0).with_infectious_period(20.0);
        let hazards = HazardCurves::from_configuration(&config).unwrap();
        let engine = TransitionEngine::new(&config, &hazards);
        let mut rng = trial_rng(5, 0);

        let mut active = ActiveCases::index_case();
        let (next, outcome) = engine
            .step(0, &mut active, DailyCounters::index_case(), &mut rng)
            .unwrap();

        // Nothing can resolve on day zero: both hazards are zero at zero days.
        assert_eq!(outcome.new_recoveries, 0);
        assert_eq!(outcome.new_hospitalizations, 0);
        assert_eq!(outcome.n_infectious, 1);
        assert_eq!(next.infected, 1 + outcome.new_cases);
        assert_eq!(active.len() as u64, 1 + outcome.new_cases);
        assert!(active.start_days().iter().all(|&d| d == 0));
    }

    #[test]
    fn test_fixed_contacts_cap_new_cases() {
        let config = config().with_transmission(Transmission::Probability(1.0));
        let hazards = HazardCurves::from_configuration(&config).unwrap();
        let engine = TransitionEngine::new(&config, &hazards);
        let mut rng = trial_rng(5, 0);

        let mut active = ActiveCases::new();
        active.add(50, 0);
        let counters = DailyCounters {
            infected: 50,
            ..DailyCounters::default()
        };
        let (next, outcome) = engine.step(0, &mut active, counters, &mut rng).unwrap();

        // Fifty infectious cases still get only `daily_contacts` opportunities.
        assert_eq!(outcome.new_cases, 20);
        assert_eq!(next.infected, 70);
    }

    #[test]
    fn test_per_infectious_contacts_scale_with_active_cases() {
        let config = config()
            .with_transmission(Transmission::Probability(1.0))
            .with_contact_mode(ContactMode::PerInfectious);
        let hazards = HazardCurves::from_configuration(&config).unwrap();
        let engine = TransitionEngine::new(&config, &hazards);
        let mut rng = trial_rng(5, 0);

        let mut active = ActiveCases::new();
        active.add(10, 0);
        let counters = DailyCounters {
            infected: 10,
            ..DailyCounters::default()
        };
        let (_, outcome) = engine.step(0, &mut active, counters, &mut rng).unwrap();
        assert_eq!(outcome.new_cases, 200);
    }

    #[test]
    fn test_susceptible_pool_limits_contacts() {
        let config = config()
            .with_population(25)
            .with_transmission(Transmission::Probability(1.0));
        let hazards = HazardCurves::from_configuration(&config).unwrap();
        let engine = TransitionEngine::new(&config, &hazards);
        let mut rng = trial_rng(5, 0);

        let mut active = ActiveCases::new();
        active.add(10, 0);
        let counters = DailyCounters {
            infected: 20,
            hospitalized: 5,
            recovered: 5,
            tested: 0,
        };
        let (next, outcome) = engine.step(0, &mut active, counters, &mut rng).unwrap();

        // susceptible = 25 - (20 + 5 + 5) saturates at zero
        assert_eq!(outcome.new_cases, 0);
        assert_eq!(next.infected, 20);
    }

    #[test]
    fn test_no_infectious_cases_means_no_new_infections() {
        let config = config()
            .with_transmission(Transmission::Probability(1.0))
            .with_incubation_period(1.0)
            .with_infectious_period(1.0);
        let hazards = HazardCurves::from_configuration(&config).unwrap();
        let engine = TransitionEngine::new(&config, &hazards);

        // Late in the curve every case resolves, so the gate closes.
        let mut rng = trial_rng(11, 0);
        let mut active = ActiveCases::new();
        active.add(5, 0);
        let counters = DailyCounters {
            infected: 5,
            ..DailyCounters::default()
        };
        let (next, outcome) = engine.step(29, &mut active, counters, &mut rng).unwrap();

        assert_eq!(outcome.n_infectious, 0);
        assert_eq!(outcome.new_cases, 0);
        assert_eq!(outcome.new_recoveries + outcome.new_hospitalizations, 5);
        assert!(active.is_empty());
        assert_eq!(next.recovered + next.hospitalized, 5);
    }
}
