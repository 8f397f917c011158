//! Tests for error types

use ward_admission::core::{AdmissionError, FailureKind};

#[test]
fn test_resource_exhausted_error() {
    let err = AdmissionError::ResourceExhausted {
        patient: "Patient 4".to_string(),
    };
    assert_eq!(format!("{}", err), "no bed available for Patient 4");
    assert_eq!(err.kind(), FailureKind::ResourceExhausted);
}

#[test]
fn test_cancelled_error() {
    let err = AdmissionError::Cancelled("stay".to_string());
    assert_eq!(format!("{}", err), "cancelled during stay");
}

#[test]
fn test_invariant_violation_error() {
    let err = AdmissionError::InvariantViolation("release of OBSTETRIC with zero occupancy".into());
    assert_eq!(
        format!("{}", err),
        "invariant violation: release of OBSTETRIC with zero occupancy"
    );
    assert_eq!(err.kind(), FailureKind::InvariantViolation);
}

#[test]
fn test_degraded_service_errors() {
    let err = AdmissionError::DiagnosisUnavailable("queue full".into());
    assert_eq!(format!("{}", err), "diagnosis unavailable: queue full");
    let err = AdmissionError::FollowUpUnavailable("offline".into());
    assert_eq!(format!("{}", err), "follow-up unavailable: offline");
}
