use outbreak_core::{Configuration, ContactMode, DiseasePreset, SimulationError, TestingMode};
use tempfile::tempdir;

#[test]
fn configuration_survives_a_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("outbreak.json");

    let config = Configuration::from_preset(DiseasePreset::find("SARS").unwrap())
        .with_population(250_000)
        .with_coverage(0.4)
        .with_seed(99)
        .with_testing_mode(TestingMode::IndependentDraws)
        .with_contact_mode(ContactMode::PerInfectious);

    config.to_json_file(&path).unwrap();
    let loaded = Configuration::from_json_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = Configuration::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SimulationError::Io(_)));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = Configuration::from_json("{ \"population\": -4 }").unwrap_err();
    assert!(matches!(err, SimulationError::Json(_)));
}

#[test]
fn mode_names_are_snake_case() {
    let config = Configuration::from_json(
        r#"{ "testing_mode": "independent_draws", "contact_mode": "per_infectious" }"#,
    )
    .unwrap();
    assert_eq!(config.testing_mode, TestingMode::IndependentDraws);
    assert_eq!(config.contact_mode, ContactMode::PerInfectious);

    let json = Configuration::default().to_json().unwrap();
    assert!(json.contains("\"shared_draw\""));
    assert!(json.contains("\"r0\""));
}
