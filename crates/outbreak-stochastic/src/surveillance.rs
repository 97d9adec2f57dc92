use outbreak_core::{Configuration, TestingMode};
use rand::Rng;

/// Turns newly hospitalized cases into tested-positive counts
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurveillanceModel {
    coverage: f64,
    testing_proportion: f64,
    sensitivity: f64,
    mode: TestingMode,
}

impl SurveillanceModel {
    pub fn new(
        coverage: f64,
        testing_proportion: f64,
        sensitivity: f64,
        mode: TestingMode,
    ) -> Self {
        Self {
            coverage,
            testing_proportion,
            sensitivity,
            mode,
        }
    }

    pub fn from_configuration(config: &Configuration) -> Self {
        Self::new(
            config.coverage,
            config.testing_proportion,
            config.sensitivity,
            config.testing_mode,
        )
    }

    /// Probability that a single hospitalized case is counted as tested positive
    pub fn detection_probability(&self) -> f64 {
        match self.mode {
            TestingMode::SharedDraw => self
                .coverage
                .min(self.testing_proportion)
                .min(self.sensitivity),
            TestingMode::IndependentDraws => {
                self.coverage * self.testing_proportion * self.sensitivity
            }
        }
    }

    /// Number of tested-positive cases among `new_hospitalizations`
    pub fn test<R: Rng + ?Sized>(&self, new_hospitalizations: u64, rng: &mut R) -> u64 {
        let mut positives = 0;
        for _ in 0..new_hospitalizations {
            let detected = match self.mode {
                TestingMode::SharedDraw => {
                    let u: f64 = rng.gen();
                    u < self.coverage && u < self.testing_proportion && u < self.sensitivity
                }
                TestingMode::IndependentDraws => {
                    rng.gen::<f64>() < self.coverage
                        && rng.gen::<f64>() < self.testing_proportion
                        && rng.gen::<f64>() < self.sensitivity
                }
            };
            if detected {
                positives += 1;
            }
        }
        positives
    }
}
