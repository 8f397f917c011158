//! Builders to construct the resource manager and orchestrator from configuration.

use std::sync::Arc;

use crate::config::AdmissionConfig;
use crate::core::{
    AdmissionError, AuditSink, DiagnosisService, DiagnosisWorkers, FollowUpService,
    InMemoryAuditSink, LifecycleContext, Orchestrator, RandomSelection, ResourceManager,
    SeededSelection, SelectionPolicy, SimulatedDiagnosisModel, SimulatedFollowUp,
};

/// Events retained by the audit trail of simulated wards.
const AUDIT_CAPACITY: usize = 4096;

/// Selection policy implied by the configured seed.
#[must_use]
pub fn selection_for(cfg: &AdmissionConfig) -> Arc<dyn SelectionPolicy> {
    match cfg.seed {
        Some(seed) => Arc::new(SeededSelection::new(seed)),
        None => Arc::new(RandomSelection),
    }
}

/// Build a resource manager from configuration.
///
/// # Errors
///
/// Returns `InvalidConfig` if validation fails.
pub fn build_manager(
    cfg: &AdmissionConfig,
    selection: Arc<dyn SelectionPolicy>,
    audit: Option<Box<dyn AuditSink>>,
) -> Result<Arc<ResourceManager>, AdmissionError> {
    cfg.validate().map_err(AdmissionError::InvalidConfig)?;
    let manager = ResourceManager::new(&cfg.capacities, cfg.roster(), cfg.timeouts(), selection)?;
    Ok(Arc::new(match audit {
        Some(sink) => manager.with_audit(sink),
        None => manager,
    }))
}

/// Build an orchestrator around the supplied collaborators.
///
/// # Errors
///
/// Returns `InvalidConfig` if validation fails or the diagnosis workers
/// cannot be started.
pub fn build_orchestrator(
    cfg: &AdmissionConfig,
    manager: Arc<ResourceManager>,
    diagnosis: Arc<dyn DiagnosisService>,
    follow_up: Arc<dyn FollowUpService>,
) -> Result<Orchestrator, AdmissionError> {
    cfg.validate().map_err(AdmissionError::InvalidConfig)?;
    let workers = DiagnosisWorkers::new(cfg.diagnosis.clone(), diagnosis)?;
    let ctx = LifecycleContext {
        manager,
        diagnosis: Arc::new(workers),
        follow_up,
        stay_step: cfg.stay_step(),
    };
    Ok(Orchestrator::new(ctx, cfg.deadline()))
}

/// Build an orchestrator with the simulated diagnosis model and follow-up
/// service, honouring the configured seed, with an in-memory audit trail.
///
/// # Errors
///
/// Returns `InvalidConfig` if validation fails.
pub fn build_simulated_orchestrator(cfg: &AdmissionConfig) -> Result<Orchestrator, AdmissionError> {
    let manager = build_manager(
        cfg,
        selection_for(cfg),
        Some(Box::new(InMemoryAuditSink::new(AUDIT_CAPACITY))),
    )?;
    let model = SimulatedDiagnosisModel::new(
        cfg.diagnosis.think_min_ms..=cfg.diagnosis.think_max_ms,
        cfg.seed,
    )?;
    let follow_up = SimulatedFollowUp::new(cfg.follow_up.clone(), cfg.seed.map(|s| s.wrapping_add(1)));
    build_orchestrator(cfg, manager, Arc::new(model), Arc::new(follow_up))
}
