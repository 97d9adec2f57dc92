use outbreak_core::{Configuration, ContactMode, TestingMode, Transmission};
use outbreak_stochastic::{EnsembleRunner, ExecutionMode};
use proptest::prelude::*;

fn arb_config() -> impl Strategy<Value = Configuration> {
    (
        (1u64..5_000, 0.0f64..=1.0, 1.0f64..10.0, 1.0f64..15.0, 0u32..30),
        (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
        (1u32..60, 1u32..4, any::<u64>(), any::<bool>(), any::<bool>()),
    )
        .prop_map(
            |(
                (population, p, incubation, infectious, contacts),
                (coverage, testing, sensitivity),
                (days, trials, seed, independent, per_infectious),
            )| {
                Configuration::default()
                    .with_population(population)
                    .with_transmission(Transmission::Probability(p))
                    .with_incubation_period(incubation)
                    .with_infectious_period(infectious)
                    .with_daily_contacts(contacts)
                    .with_coverage(coverage)
                    .with_testing_proportion(testing)
                    .with_sensitivity(sensitivity)
                    .with_simulation_days(days)
                    .with_n_simulations(trials)
                    .with_seed(seed)
                    .with_testing_mode(if independent {
                        TestingMode::IndependentDraws
                    } else {
                        TestingMode::SharedDraw
                    })
                    .with_contact_mode(if per_infectious {
                        ContactMode::PerInfectious
                    } else {
                        ContactMode::Fixed
                    })
            },
        )
}

fn run_sequential(config: &Configuration) -> outbreak_core::EnsembleResult {
    EnsembleRunner::new(config)
        .with_execution_mode(ExecutionMode::Sequential)
        .run()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn trajectories_respect_invariants(config in arb_config()) {
        let result = run_sequential(&config);
        prop_assert_eq!(result.trials.len(), config.n_simulations as usize);

        for trial in &result.trials {
            prop_assert_eq!(trial.len(), config.simulation_days as usize + 1);
            prop_assert!(trial.is_consistent(config.population));
            prop_assert_eq!(trial.infected[0], 1);
            prop_assert_eq!(trial.hospitalized[0], 0);
            prop_assert_eq!(trial.recovered[0], 0);
            prop_assert_eq!(trial.tested[0], 0);
        }
    }

    #[test]
    fn extinct_trials_stay_flat(config in arb_config()) {
        let result = run_sequential(&config);
        for trial in &result.trials {
            if let Some(extinct_on) = trial.extinction_day {
                let frozen = trial.day(extinct_on as usize).unwrap();
                for day in extinct_on as usize..trial.len() {
                    prop_assert_eq!(trial.day(day).unwrap(), frozen);
                }
            }
        }
    }

    #[test]
    fn zero_transmission_keeps_a_single_case(config in arb_config()) {
        let config = config.with_transmission(Transmission::Probability(0.0));
        let result = run_sequential(&config);
        for trial in &result.trials {
            prop_assert!(trial.infected.iter().all(|&infected| infected == 1));
        }
    }

    #[test]
    fn zero_coverage_never_tests_positive(config in arb_config()) {
        let config = config.with_coverage(0.0);
        let result = run_sequential(&config);
        for trial in &result.trials {
            prop_assert!(trial.tested.iter().all(|&tested| tested == 0));
        }
    }

    #[test]
    fn same_seed_reproduces_trajectories(config in arb_config()) {
        let first = run_sequential(&config);
        let second = EnsembleRunner::new(&config)
            .with_execution_mode(ExecutionMode::Parallel)
            .run()
            .unwrap();
        prop_assert_eq!(first.trials, second.trials);
    }
}
