use serde::Serialize;

/// Published characteristics of a known pathogen, used to seed a [`Configuration`]
///
/// [`Configuration`]: crate::Configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DiseasePreset {
    pub name: &'static str,

    /// Daily transmission rate (beta)
    pub transmission_rate: f64,

    /// Days from infection to symptoms
    pub incubation_period: f64,

    /// Days of infectiousness
    pub infectious_period: f64,
}

impl DiseasePreset {
    /// Basic reproduction number: `transmission_rate * infectious_period`
    pub fn r0(&self) -> f64 {
        self.transmission_rate * self.infectious_period
    }

    /// Look up a preset by name, ignoring case
    pub fn find(name: &str) -> Option<&'static DiseasePreset> {
        DISEASE_PRESETS
            .iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name))
    }
}

pub static DISEASE_PRESETS: [DiseasePreset; 5] = [
    DiseasePreset {
        name: "SARS-CoV-2 (Wild-type)",
        transmission_rate: 0.32,
        incubation_period: 6.67,
        infectious_period: 8.0,
    },
    DiseasePreset {
        name: "SARS-CoV-2 (Omicron)",
        transmission_rate: 1.19,
        incubation_period: 4.0,
        infectious_period: 8.0,
    },
    DiseasePreset {
        name: "SARS",
        transmission_rate: 0.24,
        incubation_period: 4.0,
        infectious_period: 10.0,
    },
    DiseasePreset {
        name: "Seasonal Influenza",
        transmission_rate: 0.33,
        incubation_period: 2.0,
        infectious_period: 4.0,
    },
    DiseasePreset {
        name: "1918 Influenza",
        transmission_rate: 0.5,
        incubation_period: 2.0,
        infectious_period: 4.0,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Configuration;

    #[test]
    fn test_preset_r0() {
        let wild_type = DiseasePreset::find("sars-cov-2 (wild-type)").unwrap();
        assert!((wild_type.r0() - 2.56).abs() < 1e-9);

        let omicron = DiseasePreset::find("SARS-CoV-2 (Omicron)").unwrap();
        assert!(omicron.r0() > 9.0);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(DiseasePreset::find("Measles").is_none());
    }

    #[test]
    fn test_every_preset_yields_a_valid_configuration() {
        for preset in &DISEASE_PRESETS {
            let config = Configuration::from_preset(preset);
            assert!(config.validate().is_ok(), "preset {} is invalid", preset.name);
            assert_eq!(config.incubation_period, preset.incubation_period);
        }
    }
}
