//! Optimization solver setup and execution

use argmin::core::observers::{Observe, ObserverMode};
use argmin::core::{Executor, IterState, PopulationState};
use argmin::solver::neldermead::NelderMead;
use argmin::solver::particleswarm::{Particle, ParticleSwarm};
use argmin_observer_slog::SlogLogger;
use outbreak_core::SimulationEngine;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calibration_problem::CalibrationProblem;
use crate::error::{CalibrationError, CalibrationOutcome};
use crate::types::CalibrationResult;

/// Relative perturbation used to build the initial simplex
const SIMPLEX_PERTURBATION: f64 = 0.1;

/// Offset used for an axis whose initial value is zero
const SIMPLEX_ZERO_STEP: f64 = 0.00025;

/// Solver state observed during a Nelder-Mead run
pub type SimplexState = IterState<Vec<f64>, (), (), (), (), f64>;

/// Solver state observed during a particle swarm run
pub type SwarmState = PopulationState<Particle<Vec<f64>, f64>, f64>;

/// Configuration for Nelder-Mead optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    pub max_iterations: u64,

    /// Standard deviation of simplex costs below which the search stops
    pub sd_tolerance: f64,

    /// Reflection (argmin default 1.0)
    pub alpha: Option<f64>,

    /// Expansion (argmin default 2.0)
    pub gamma: Option<f64>,

    /// Contraction (argmin default 0.5)
    pub rho: Option<f64>,

    /// Shrinking (argmin default 0.5)
    pub sigma: Option<f64>,

    /// Attach a terminal progress logger
    pub verbose: bool,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            sd_tolerance: 1e-6,
            alpha: None,
            gamma: None,
            rho: None,
            sigma: None,
            verbose: false,
        }
    }
}

impl NelderMeadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_sd_tolerance(mut self, tolerance: f64) -> Self {
        self.sd_tolerance = tolerance;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = Some(rho);
        self
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Configuration for particle swarm optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSwarmConfig {
    pub num_particles: usize,

    pub max_iterations: u64,

    /// Stop once the best cost reaches this value
    pub target_cost: Option<f64>,

    /// Velocity inertia (argmin default 1/(2 ln 2))
    pub inertia_factor: Option<f64>,

    /// Attraction to the particle's own best (argmin default 0.5 + ln 2)
    pub cognitive_factor: Option<f64>,

    /// Attraction to the swarm's best (argmin default 0.5 + ln 2)
    pub social_factor: Option<f64>,

    pub verbose: bool,
}

impl Default for ParticleSwarmConfig {
    fn default() -> Self {
        Self {
            num_particles: 20,
            max_iterations: 1000,
            target_cost: None,
            inertia_factor: None,
            cognitive_factor: None,
            social_factor: None,
            verbose: false,
        }
    }
}

impl ParticleSwarmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_particles(mut self, num_particles: usize) -> Self {
        self.num_particles = num_particles;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_target_cost(mut self, target_cost: f64) -> Self {
        self.target_cost = Some(target_cost);
        self
    }

    pub fn with_inertia_factor(mut self, factor: f64) -> Self {
        self.inertia_factor = Some(factor);
        self
    }

    pub fn with_cognitive_factor(mut self, factor: f64) -> Self {
        self.cognitive_factor = Some(factor);
        self
    }

    pub fn with_social_factor(mut self, factor: f64) -> Self {
        self.social_factor = Some(factor);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Algorithm-specific optimization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationConfig {
    /// Simplex search from the initial guesses. Suited to a handful of parameters.
    NelderMead(NelderMeadConfig),

    /// Global search within the parameter bounds
    ParticleSwarm(ParticleSwarmConfig),
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationConfig::NelderMead(NelderMeadConfig::default())
    }
}

impl OptimizationConfig {
    pub fn verbose(&self) -> bool {
        match self {
            OptimizationConfig::NelderMead(config) => config.verbose,
            OptimizationConfig::ParticleSwarm(config) => config.verbose,
        }
    }
}

/// Run optimization on a calibration problem
///
/// ```rust,ignore
/// use outbreak_calibration::{optimize, NelderMeadConfig, OptimizationConfig};
///
/// let config = OptimizationConfig::NelderMead(NelderMeadConfig::new().with_max_iterations(200));
/// let result = optimize(problem, config)?;
/// println!("{:?} -> {}", result.parameters_map(), result.final_loss);
/// ```
pub fn optimize<E: SimulationEngine>(
    problem: CalibrationProblem<E>,
    config: OptimizationConfig,
) -> CalibrationOutcome<CalibrationResult> {
    let observer = config.verbose().then(SlogLogger::term);
    optimize_with_observer(problem, config, observer)
}

/// Same as [`optimize`], reporting progress to `observer` instead of the terminal logger
pub fn optimize_with_observer<E, O>(
    problem: CalibrationProblem<E>,
    config: OptimizationConfig,
    observer: Option<O>,
) -> CalibrationOutcome<CalibrationResult>
where
    E: SimulationEngine,
    O: Observe<SimplexState> + Observe<SwarmState> + 'static,
{
    let initial_params = problem.initial_parameters();
    let parameter_names = problem.parameter_names();

    let result = match config {
        OptimizationConfig::NelderMead(nm_config) => {
            optimize_nelder_mead(problem, initial_params, parameter_names, nm_config, observer)
        }
        OptimizationConfig::ParticleSwarm(ps_config) => {
            optimize_particle_swarm(problem, initial_params, parameter_names, ps_config, observer)
        }
    }?;

    info!(
        parameters = ?result.parameters_map(),
        loss = result.final_loss,
        iterations = result.iterations,
        reason = %result.termination_reason,
        "calibration finished"
    );
    Ok(result)
}

fn optimizer_error(context: &str) -> impl Fn(argmin::core::Error) -> CalibrationError + '_ {
    move |e| CalibrationError::Optimizer(format!("{context}: {e}"))
}

/// Initial simplex: the starting point plus one vertex per axis, each nudged by 10%
fn initial_simplex(initial_params: &[f64]) -> Vec<Vec<f64>> {
    let mut vertices = vec![initial_params.to_vec()];
    for i in 0..initial_params.len() {
        let mut vertex = initial_params.to_vec();
        vertex[i] = if vertex[i] == 0.0 {
            SIMPLEX_ZERO_STEP
        } else {
            vertex[i] * (1.0 + SIMPLEX_PERTURBATION)
        };
        vertices.push(vertex);
    }
    vertices
}

fn optimize_nelder_mead<E, O>(
    problem: CalibrationProblem<E>,
    initial_params: Vec<f64>,
    parameter_names: Vec<String>,
    config: NelderMeadConfig,
    observer: Option<O>,
) -> CalibrationOutcome<CalibrationResult>
where
    E: SimulationEngine,
    O: Observe<SimplexState> + 'static,
{
    let mut solver = NelderMead::new(initial_simplex(&initial_params))
        .with_sd_tolerance(config.sd_tolerance)
        .map_err(optimizer_error("sd_tolerance"))?;

    if let Some(alpha) = config.alpha {
        solver = solver.with_alpha(alpha).map_err(optimizer_error("alpha"))?;
    }
    if let Some(gamma) = config.gamma {
        solver = solver.with_gamma(gamma).map_err(optimizer_error("gamma"))?;
    }
    if let Some(rho) = config.rho {
        solver = solver.with_rho(rho).map_err(optimizer_error("rho"))?;
    }
    if let Some(sigma) = config.sigma {
        solver = solver.with_sigma(sigma).map_err(optimizer_error("sigma"))?;
    }

    info!(
        parameters = ?parameter_names,
        initial = ?initial_params,
        max_iterations = config.max_iterations,
        sd_tolerance = config.sd_tolerance,
        "nelder-mead calibration starting"
    );

    let executor =
        Executor::new(problem, solver).configure(|state| state.max_iters(config.max_iterations));

    let executor = match observer {
        Some(observer) => executor.add_observer(observer, ObserverMode::Always),
        None => executor,
    };
    let result = executor.run().map_err(optimizer_error("nelder-mead"))?;

    let state = result.state();
    Ok(CalibrationResult {
        best_parameters: state.best_param.clone().unwrap_or(initial_params),
        parameter_names,
        final_loss: state.best_cost,
        iterations: state.iter as usize,
        converged: state.termination_status.terminated(),
        termination_reason: format!("{:?}", state.termination_status),
    })
}

fn optimize_particle_swarm<E, O>(
    problem: CalibrationProblem<E>,
    initial_params: Vec<f64>,
    parameter_names: Vec<String>,
    config: ParticleSwarmConfig,
    observer: Option<O>,
) -> CalibrationOutcome<CalibrationResult>
where
    E: SimulationEngine,
    O: Observe<SwarmState> + 'static,
{
    let bounds = problem.parameter_bounds();
    let lower_bound: Vec<f64> = bounds.iter().map(|(min, _)| *min).collect();
    let upper_bound: Vec<f64> = bounds.iter().map(|(_, max)| *max).collect();

    let mut solver = ParticleSwarm::new((lower_bound, upper_bound), config.num_particles);

    if let Some(inertia) = config.inertia_factor {
        solver = solver
            .with_inertia_factor(inertia)
            .map_err(optimizer_error("inertia_factor"))?;
    }
    if let Some(cognitive) = config.cognitive_factor {
        solver = solver
            .with_cognitive_factor(cognitive)
            .map_err(optimizer_error("cognitive_factor"))?;
    }
    if let Some(social) = config.social_factor {
        solver = solver
            .with_social_factor(social)
            .map_err(optimizer_error("social_factor"))?;
    }

    info!(
        parameters = ?parameter_names,
        bounds = ?bounds,
        particles = config.num_particles,
        max_iterations = config.max_iterations,
        target_cost = ?config.target_cost,
        "particle swarm calibration starting"
    );

    let executor = Executor::new(problem, solver).configure(|state| {
        let state = state.max_iters(config.max_iterations);
        match config.target_cost {
            Some(target) => state.target_cost(target),
            None => state,
        }
    });

    let executor = match observer {
        Some(observer) => executor.add_observer(observer, ObserverMode::Always),
        None => executor,
    };
    let result = executor.run().map_err(optimizer_error("particle swarm"))?;

    let state = result.state();
    let (best_parameters, final_loss) = match &state.best_individual {
        Some(particle) => (particle.position.clone(), particle.cost),
        None => (initial_params, f64::INFINITY),
    };

    Ok(CalibrationResult {
        best_parameters,
        parameter_names,
        final_loss,
        iterations: state.iter as usize,
        converged: state.termination_status.terminated(),
        termination_reason: format!("{:?}", state.termination_status),
    })
}
