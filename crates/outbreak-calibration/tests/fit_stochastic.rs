use outbreak_calibration::{
    optimize, CalibrationError, CalibrationParameter, CalibrationProblem, LossConfig,
    NelderMeadConfig, ObservedDataPoint, OptimizationConfig, ParticleSwarmConfig,
};
use outbreak_core::{Configuration, Series, SimulationEngine, Transmission};
use outbreak_stochastic::{ExecutionMode, StochasticEngine};

fn engine() -> StochasticEngine {
    StochasticEngine::from_configuration(
        Configuration::default()
            .with_population(100_000)
            .with_transmission(Transmission::Probability(0.0125))
            .with_simulation_days(30)
            .with_n_simulations(8)
            .with_seed(4242),
    )
    .with_execution_mode(ExecutionMode::Sequential)
}

/// Observations taken from the engine's own mean trajectory
fn synthetic_observations(engine: &StochasticEngine) -> Vec<ObservedDataPoint> {
    let result = engine.run().unwrap();
    [10u32, 20, 30]
        .iter()
        .flat_map(|&day| {
            [Series::Infected, Series::Hospitalized].map(|series| {
                ObservedDataPoint::new(
                    day,
                    series.name(),
                    result.mean.series(series)[day as usize],
                )
            })
        })
        .collect()
}

#[test]
fn loss_vanishes_at_the_generating_parameters() {
    let engine = engine();
    let observed = synthetic_observations(&engine);
    let problem = CalibrationProblem::new(
        engine,
        observed,
        vec![CalibrationParameter::new("transmission_prob", 0.0, 0.05)],
        LossConfig::SumSquaredError,
    )
    .unwrap();

    assert_eq!(problem.evaluate(&[0.0125]).unwrap(), 0.0);
    assert!(problem.evaluate(&[0.0]).unwrap() > 0.0);
    assert_eq!(problem.evaluate(&[0.2]).unwrap(), f64::INFINITY);
}

#[test]
fn infeasible_r0_costs_infinity() {
    let engine = engine();
    let observed = synthetic_observations(&engine);
    // 20 contacts over 10 infectious days: any R0 above 200 implies a probability above 1.
    let problem = CalibrationProblem::new(
        engine,
        observed,
        vec![CalibrationParameter::with_initial_guess("r0", 0.5, 500.0, 2.5)],
        LossConfig::RootMeanSquaredError,
    )
    .unwrap();

    assert_eq!(problem.evaluate(&[300.0]).unwrap(), f64::INFINITY);
    assert!(problem.evaluate(&[2.5]).unwrap().is_finite());
}

#[test]
fn unseeded_engine_is_rejected() {
    let mut engine = engine();
    let observed = synthetic_observations(&engine);
    engine.set_seed(None);

    let err = CalibrationProblem::new(
        engine,
        observed,
        vec![CalibrationParameter::new("coverage", 0.0, 1.0)],
        LossConfig::SumSquaredError,
    )
    .err()
    .unwrap();
    assert!(matches!(err, CalibrationError::MissingSeed));
}

#[test]
fn nelder_mead_never_ends_worse_than_its_start() {
    let engine = engine();
    let observed = synthetic_observations(&engine);
    let problem = CalibrationProblem::new(
        engine,
        observed,
        vec![CalibrationParameter::with_initial_guess(
            "transmission_prob",
            0.0,
            0.05,
            0.0125,
        )],
        LossConfig::SumSquaredError,
    )
    .unwrap();

    let result = optimize(
        problem,
        OptimizationConfig::NelderMead(NelderMeadConfig::new().with_max_iterations(15)),
    )
    .unwrap();

    assert_eq!(result.parameter_names, vec!["transmission_prob".to_string()]);
    assert_eq!(result.final_loss, 0.0);
    assert!(result.iterations <= 15);
}

#[test]
fn particle_swarm_stays_within_bounds() {
    let engine = engine();
    let observed = synthetic_observations(&engine);
    let problem = CalibrationProblem::new(
        engine,
        observed,
        vec![CalibrationParameter::new("transmission_prob", 0.005, 0.03)],
        LossConfig::MeanAbsoluteError,
    )
    .unwrap();

    let result = optimize(
        problem,
        OptimizationConfig::ParticleSwarm(
            ParticleSwarmConfig::new()
                .with_num_particles(6)
                .with_max_iterations(5),
        ),
    )
    .unwrap();

    let best = result.parameters_map()["transmission_prob"];
    assert!((0.005..=0.03).contains(&best), "best {best}");
    assert!(result.final_loss.is_finite());
}
