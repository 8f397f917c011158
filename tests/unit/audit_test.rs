//! Tests for the audit trail

use ward_admission::core::{
    build_audit_event, AuditAction, AuditSink, BedCategory, InMemoryAuditSink,
};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    sink.record(build_audit_event(
        Some(3),
        Some(BedCategory::IntensiveCare),
        AuditAction::Assign,
        Some("Dr. Connor / Resident Lerin".to_string()),
    ));

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].patient_id, Some(3));
    assert_eq!(events[0].category, Some(BedCategory::IntensiveCare));
    assert_eq!(events[0].action, AuditAction::Assign);
    assert!(events[0].created_at_ms > 0);
}

#[test]
fn test_zero_capacity_sink_keeps_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(None, None, AuditAction::Release, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_audit_event_serializes_action() {
    let event = build_audit_event(Some(1), None, AuditAction::Exhausted, None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "exhausted");
}
