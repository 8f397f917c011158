//! Admission core: bed pools, allocation, diagnosis workers and patient lifecycles.

pub mod audit;
pub mod diagnosis;
pub mod error;
pub mod follow_up;
pub mod lifecycle;
pub mod model;
pub mod orchestrator;
pub mod resource_manager;
pub mod resource_pool;
pub mod selection;
pub mod worker_pool;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use diagnosis::{
    stay_for, CatalogEntry, DiagnosisService, FixedDiagnosis, SimulatedDiagnosisModel,
    UnavailableDiagnosis, DIAGNOSIS_CATALOG,
};
pub use error::{AdmissionError, AppResult, FailureKind};
pub use follow_up::{FollowUpService, SimulatedFollowUp, UnavailableFollowUp, SPECIALIST_DIAGNOSES};
pub use lifecycle::{LifecycleContext, LifecycleState, PatientLifecycle, PatientOutcome};
pub use model::{BedCategory, Diagnosis, Patient, PatientId, Protocol, Shift};
pub use orchestrator::{BatchResult, FailedAdmission, Orchestrator};
pub use resource_manager::{
    preferred_category, AcquisitionTimeouts, BedAssignment, CategoryOccupancy, OccupancyReport,
    ResourceManager, StaffRoster,
};
pub use resource_pool::{BedPool, PoolPermit};
pub use selection::{
    FirstSelection, RandomSelection, RoundRobinSelection, SeededSelection, SelectionPolicy,
};
pub use worker_pool::{DiagnosisWorkers, PoolStats};
