//! Per-individual, discrete-time stochastic outbreak simulation.
//!
//! Each trial tracks only the infection start days of currently infectious individuals.
//! Every simulated day resolves those cases against the hazard curves, draws new
//! infections from a well-mixed susceptible pool and passes new hospitalisations through
//! surveillance testing. Trials are independent, so an ensemble runs them sequentially or
//! in parallel with identical results for a given seed.
//!
//! ## Example
//! ```rust
//! use outbreak_core::Configuration;
//! use outbreak_stochastic::run_ensemble;
//!
//! let config = Configuration::default()
//!     .with_population(100_000)
//!     .with_n_simulations(4)
//!     .with_seed(42);
//! let result = run_ensemble(&config).unwrap();
//! assert_eq!(result.mean.infected.len(), 43);
//! ```

pub mod engine;
pub mod ensemble;
pub mod rng;
pub mod surveillance;
pub mod transition;
pub mod trial;

pub use engine::StochasticEngine;
pub use ensemble::{run_ensemble, CancellationToken, EnsembleRunner, ExecutionMode, TrialTask};
pub use surveillance::SurveillanceModel;
pub use transition::{ActiveCases, DayOutcome, TransitionEngine};
pub use trial::Trial;
