//! Tests for builders

use std::sync::Arc;

use ward_admission::builders::{build_manager, build_simulated_orchestrator};
use ward_admission::config::AdmissionConfig;
use ward_admission::core::{AdmissionError, BedCategory, FirstSelection};

#[test]
fn test_build_manager_from_default_config() {
    let cfg = AdmissionConfig::default();
    let manager = build_manager(&cfg, Arc::new(FirstSelection), None).unwrap();

    let report = manager.occupancy_report();
    assert_eq!(report.categories.len(), 4);
    assert_eq!(report.get(BedCategory::Obstetric).unwrap().remaining, 10);
    assert_eq!(report.total_held(), 0);
    assert!(manager.audit_events().is_empty());
}

#[test]
fn test_build_manager_rejects_invalid_config() {
    let mut cfg = AdmissionConfig::default();
    cfg.capacities.insert(BedCategory::Obstetric, 0);
    let err = build_manager(&cfg, Arc::new(FirstSelection), None).unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidConfig(_)));
}

#[test]
fn test_build_simulated_orchestrator() {
    let mut cfg = AdmissionConfig::default();
    cfg.seed = Some(11);
    let orchestrator = build_simulated_orchestrator(&cfg).unwrap();
    let stats = orchestrator.context().diagnosis.stats();
    assert_eq!(stats.worker_count, cfg.diagnosis.worker_count);
    assert_eq!(stats.submitted, 0);
    orchestrator.context().diagnosis.shutdown();
}
