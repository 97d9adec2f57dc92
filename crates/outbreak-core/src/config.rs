//! Simulation configuration.
//!
//! A [`Configuration`] is the single immutable record every component reads from. It is
//! usually built once per user interaction, either from JSON or through the `with_*`
//! builder methods, and checked with [`Configuration::validate`] before any trial runs.
//!
//! ## Example
//! ```rust
//! use outbreak_core::{Configuration, Transmission};
//!
//! let config = Configuration::default()
//!     .with_population(9_000_000)
//!     .with_transmission(Transmission::R0(2.5))
//!     .with_simulation_days(42)
//!     .with_seed(7);
//! config.validate().unwrap();
//! assert!((config.transmission_prob() - 0.0125).abs() < 1e-12);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulationResult};
use crate::presets::DiseasePreset;

/// Parameter ids accepted by [`Configuration::parameter`] and [`Configuration::set_parameter`]
pub const PARAMETER_IDS: &[&str] = &[
    "r0",
    "transmission_prob",
    "incubation_period",
    "infectious_period",
    "daily_contacts",
    "coverage",
    "testing_proportion",
    "sensitivity",
];

/// How the per-contact transmission probability is specified
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transmission {
    /// Basic reproduction number; the per-contact probability is derived from it
    R0(f64),
    /// Per-contact transmission probability supplied directly
    Probability(f64),
}

/// How a newly hospitalized case is turned into a tested-positive count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestingMode {
    /// One uniform draw compared against coverage, testing proportion and sensitivity.
    /// The effective detection probability is the minimum of the three.
    #[default]
    SharedDraw,
    /// An independent draw per gate. The effective detection probability is the product.
    IndependentDraws,
}

/// How many contact opportunities a simulated day offers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMode {
    /// `daily_contacts` opportunities per day while at least one case is infectious
    #[default]
    Fixed,
    /// `daily_contacts` opportunities per infectious case per day
    PerInfectious,
}

/// Immutable parameters for one ensemble run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Population size N
    pub population: u64,

    /// Basic reproduction number or direct per-contact probability
    pub transmission: Transmission,

    /// Days from infection to symptoms
    pub incubation_period: f64,

    /// Days an individual stays infectious
    pub infectious_period: f64,

    /// Contact opportunities per simulated day
    pub daily_contacts: u32,

    /// Share of hospital patients covered by surveillance sites
    pub coverage: f64,

    /// Share of covered patients that are actually tested
    pub testing_proportion: f64,

    /// Test sensitivity
    pub sensitivity: f64,

    /// Number of simulated days; trajectories have `simulation_days + 1` entries
    pub simulation_days: u32,

    /// Number of independent trials in the ensemble
    pub n_simulations: u32,

    /// Base seed. `None` draws a fresh seed from OS entropy on every run.
    pub seed: Option<u64>,

    /// Cumulative tested-positive count that counts as detection
    pub detection_threshold: u64,

    pub testing_mode: TestingMode,

    pub contact_mode: ContactMode,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            population: 9_000_000,
            transmission: Transmission::R0(2.5),
            incubation_period: 4.0,
            infectious_period: 10.0,
            daily_contacts: 20,
            coverage: 1.0,
            testing_proportion: 0.8,
            sensitivity: 0.85,
            simulation_days: 42,
            n_simulations: 10,
            seed: None,
            detection_threshold: 1,
            testing_mode: TestingMode::SharedDraw,
            contact_mode: ContactMode::Fixed,
        }
    }
}

impl Configuration {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a disease preset, keeping every non-disease field at its default
    pub fn from_preset(preset: &DiseasePreset) -> Self {
        Self {
            transmission: Transmission::R0(preset.r0()),
            incubation_period: preset.incubation_period,
            infectious_period: preset.infectious_period,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> SimulationResult<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Parse a configuration from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SimulationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SimulationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> SimulationResult<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = population;
        self
    }

    pub fn with_transmission(mut self, transmission: Transmission) -> Self {
        self.transmission = transmission;
        self
    }

    pub fn with_incubation_period(mut self, days: f64) -> Self {
        self.incubation_period = days;
        self
    }

    pub fn with_infectious_period(mut self, days: f64) -> Self {
        self.infectious_period = days;
        self
    }

    pub fn with_daily_contacts(mut self, contacts: u32) -> Self {
        self.daily_contacts = contacts;
        self
    }

    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_testing_proportion(mut self, proportion: f64) -> Self {
        self.testing_proportion = proportion;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_simulation_days(mut self, days: u32) -> Self {
        self.simulation_days = days;
        self
    }

    pub fn with_n_simulations(mut self, n_simulations: u32) -> Self {
        self.n_simulations = n_simulations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_detection_threshold(mut self, threshold: u64) -> Self {
        self.detection_threshold = threshold;
        self
    }

    pub fn with_testing_mode(mut self, mode: TestingMode) -> Self {
        self.testing_mode = mode;
        self
    }

    pub fn with_contact_mode(mut self, mode: ContactMode) -> Self {
        self.contact_mode = mode;
        self
    }

    /// Per-contact transmission probability.
    ///
    /// When derived from R0 this is `R0 / (daily_contacts * infectious_period)`. The value
    /// is only meaningful for a configuration that passed [`Configuration::validate`].
    pub fn transmission_prob(&self) -> f64 {
        match self.transmission {
            Transmission::Probability(p) => p,
            Transmission::R0(r0) => r0 / (self.daily_contacts as f64 * self.infectious_period),
        }
    }

    /// Basic reproduction number, derived from the per-contact probability if needed
    pub fn r0(&self) -> f64 {
        match self.transmission {
            Transmission::R0(r0) => r0,
            Transmission::Probability(p) => p * self.daily_contacts as f64 * self.infectious_period,
        }
    }

    /// Scale of the hospitalisation hazard: `incubation_period + infectious_period / 2`
    pub fn median_hospitalisation_time(&self) -> f64 {
        self.incubation_period + self.infectious_period / 2.0
    }

    /// Check every field against its valid range
    pub fn validate(&self) -> SimulationResult<()> {
        if self.population < 1 {
            return Err(SimulationError::invalid(
                "population",
                self.population as f64,
                "must be at least 1",
            ));
        }

        match self.transmission {
            Transmission::R0(r0) => {
                if !r0.is_finite() || r0 <= 0.0 {
                    return Err(SimulationError::invalid("r0", r0, "must be positive and finite"));
                }
                let opportunities = self.daily_contacts as f64 * self.infectious_period;
                if opportunities == 0.0 {
                    return Err(SimulationError::invalid(
                        "daily_contacts",
                        self.daily_contacts as f64,
                        "daily_contacts * infectious_period is zero, transmission_prob is undefined",
                    ));
                }
                let derived = r0 / opportunities;
                if derived > 1.0 {
                    return Err(SimulationError::invalid(
                        "r0",
                        r0,
                        format!("derived transmission_prob {derived} exceeds 1"),
                    ));
                }
            }
            Transmission::Probability(p) => check_probability("transmission_prob", p)?,
        }

        check_at_least("incubation_period", self.incubation_period, 1.0)?;
        check_at_least("infectious_period", self.infectious_period, 1.0)?;
        check_probability("coverage", self.coverage)?;
        check_probability("testing_proportion", self.testing_proportion)?;
        check_probability("sensitivity", self.sensitivity)?;

        if self.simulation_days < 1 {
            return Err(SimulationError::invalid(
                "simulation_days",
                self.simulation_days as f64,
                "must be at least 1",
            ));
        }
        if self.n_simulations < 1 {
            return Err(SimulationError::invalid(
                "n_simulations",
                self.n_simulations as f64,
                "must be at least 1",
            ));
        }
        if self.detection_threshold < 1 {
            return Err(SimulationError::invalid(
                "detection_threshold",
                self.detection_threshold as f64,
                "must be at least 1",
            ));
        }

        Ok(())
    }

    /// Read a named model parameter (see [`PARAMETER_IDS`])
    pub fn parameter(&self, id: &str) -> SimulationResult<f64> {
        let value = match id {
            "r0" => self.r0(),
            "transmission_prob" => self.transmission_prob(),
            "incubation_period" => self.incubation_period,
            "infectious_period" => self.infectious_period,
            "daily_contacts" => self.daily_contacts as f64,
            "coverage" => self.coverage,
            "testing_proportion" => self.testing_proportion,
            "sensitivity" => self.sensitivity,
            _ => return Err(unknown_parameter(id)),
        };
        Ok(value)
    }

    /// Overwrite a named model parameter (see [`PARAMETER_IDS`]).
    ///
    /// Setting `r0` or `transmission_prob` switches how transmission is specified.
    /// `daily_contacts` is rounded to the nearest whole contact. Range checks are left to
    /// [`Configuration::validate`].
    pub fn set_parameter(&mut self, id: &str, value: f64) -> SimulationResult<()> {
        if !value.is_finite() {
            return Err(SimulationError::invalid(id, value, "must be finite"));
        }
        match id {
            "r0" => self.transmission = Transmission::R0(value),
            "transmission_prob" => self.transmission = Transmission::Probability(value),
            "incubation_period" => self.incubation_period = value,
            "infectious_period" => self.infectious_period = value,
            "daily_contacts" => {
                if value < 0.0 || value > u32::MAX as f64 {
                    return Err(SimulationError::invalid(id, value, "must fit a contact count"));
                }
                self.daily_contacts = value.round() as u32;
            }
            "coverage" => self.coverage = value,
            "testing_proportion" => self.testing_proportion = value,
            "sensitivity" => self.sensitivity = value,
            _ => return Err(unknown_parameter(id)),
        }
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> SimulationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimulationError::invalid(name, value, "must be within [0, 1]"));
    }
    Ok(())
}

fn check_at_least(name: &str, value: f64, min: f64) -> SimulationResult<()> {
    if !value.is_finite() || value < min {
        return Err(SimulationError::invalid(
            name,
            value,
            format!("must be finite and at least {min}"),
        ));
    }
    Ok(())
}

fn unknown_parameter(id: &str) -> SimulationError {
    SimulationError::invalid(
        id,
        f64::NAN,
        format!("unknown parameter (available: {})", PARAMETER_IDS.join(", ")),
    )
}
