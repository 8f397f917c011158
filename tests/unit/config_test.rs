//! Tests for configuration validation

use ward_admission::config::AdmissionConfig;
use ward_admission::core::{BedCategory, Shift};

#[test]
fn test_default_config_matches_reference_ward() {
    let cfg = AdmissionConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.capacities[&BedCategory::Obstetric], 10);
    assert_eq!(cfg.capacities[&BedCategory::Gynecological], 5);
    assert_eq!(cfg.capacities[&BedCategory::IntensiveCare], 3);
    assert_eq!(cfg.capacities[&BedCategory::Bereavement], 2);
    assert_eq!(cfg.batch_size, 15);
    assert_eq!(cfg.timeouts().primary.as_secs(), 30);
    assert_eq!(cfg.timeouts().secondary.as_secs(), 10);
}

#[test]
fn test_missing_category_rejected() {
    let mut cfg = AdmissionConfig::default();
    cfg.capacities.remove(&BedCategory::Bereavement);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("BEREAVEMENT"));
}

#[test]
fn test_zero_capacity_rejected() {
    let mut cfg = AdmissionConfig::default();
    cfg.capacities.insert(BedCategory::IntensiveCare, 0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_empty_physician_roster_rejected() {
    let mut cfg = AdmissionConfig::default();
    cfg.physicians.insert(Shift::Evening, Vec::new());
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("EVENING"));
}

#[test]
fn test_empty_residents_rejected() {
    let mut cfg = AdmissionConfig::default();
    cfg.residents.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let mut cfg = AdmissionConfig::default();
    cfg.secondary_timeout_ms = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_probability_out_of_range_rejected() {
    let mut cfg = AdmissionConfig::default();
    cfg.follow_up.baseline_probability = 1.5;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "capacities": {
            "OBSTETRIC": 2,
            "GYNECOLOGICAL": 1,
            "INTENSIVE_CARE": 1,
            "BEREAVEMENT": 1
        },
        "physicians": {
            "MORNING": ["Dr. Esquivel"],
            "EVENING": ["Dr. Connor"],
            "NIGHT": ["Dr. Gamez"]
        },
        "residents": ["Resident Garcia"],
        "primary_timeout_ms": 100,
        "secondary_timeout_ms": 20,
        "batch_size": 4,
        "seed": 7
    }"#;

    let cfg = AdmissionConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.capacities[&BedCategory::Obstetric], 2);
    assert_eq!(cfg.physicians[&Shift::Night], vec!["Dr. Gamez".to_string()]);
    assert_eq!(cfg.timeouts().primary.as_millis(), 100);
    assert_eq!(cfg.batch_size, 4);
    assert_eq!(cfg.seed, Some(7));
    // Omitted fields fall back to defaults.
    assert_eq!(cfg.stay_step_ms, 500);
}

#[test]
fn test_config_from_json_invalid() {
    let json = r#"{ "capacities": { "OBSTETRIC": 1 } }"#;
    assert!(AdmissionConfig::from_json_str(json).is_err());
    assert!(AdmissionConfig::from_json_str("not json").is_err());
}
