//! Batch fan-out/fan-in of patient lifecycles under a global deadline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::{
    FailureKind, LifecycleContext, LifecycleState, OccupancyReport, Patient, PatientLifecycle,
    PatientOutcome,
};

/// A patient that did not complete the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedAdmission {
    /// Patient record as of the failure.
    pub patient: Patient,
    /// Last stage reached; `None` when the unit was aborted by the runtime.
    pub stage: Option<LifecycleState>,
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable cause.
    pub reason: String,
}

/// Result of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// Patients that were discharged, in admission order.
    pub discharged: Vec<Patient>,
    /// Patients that failed or were still in flight at the deadline.
    pub failed: Vec<FailedAdmission>,
    /// Occupancy after every unit finished.
    pub occupancy: OccupancyReport,
}

impl BatchResult {
    /// Number of discharged patients.
    #[must_use]
    pub fn discharged_count(&self) -> usize {
        self.discharged.len()
    }

    /// Number of failed or incomplete patients.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Runs a batch of patients concurrently against one resource manager.
pub struct Orchestrator {
    ctx: LifecycleContext,
    deadline: Duration,
}

impl Orchestrator {
    /// Create an orchestrator whose batches are bounded by `deadline`.
    #[must_use]
    pub const fn new(ctx: LifecycleContext, deadline: Duration) -> Self {
        Self { ctx, deadline }
    }

    /// Shared lifecycle context.
    #[must_use]
    pub const fn context(&self) -> &LifecycleContext {
        &self.ctx
    }

    /// Admit every patient concurrently and wait for all of them.
    ///
    /// Units still running when the deadline passes are cancelled; their
    /// beds are released and they are reported as failed.
    pub async fn run(&self, patients: Vec<Patient>) -> BatchResult {
        let run_id = Uuid::new_v4();
        let batch_size = patients.len();
        info!(%run_id, batch_size, deadline_ms = self.deadline.as_millis(), "batch started");

        let cancel = CancellationToken::new();
        let watchdog = {
            let cancel = cancel.clone();
            let deadline = self.deadline;
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                warn!("batch deadline reached, cancelling in-flight admissions");
                cancel.cancel();
            })
        };

        let units: Vec<_> = patients
            .into_iter()
            .map(|patient| {
                let registered = patient.clone();
                let lifecycle =
                    PatientLifecycle::new(self.ctx.clone(), patient, cancel.child_token());
                (registered, tokio::spawn(lifecycle.run()))
            })
            .collect();

        let mut discharged = Vec::new();
        let mut failed = Vec::new();
        for (registered, handle) in units {
            match handle.await {
                Ok(PatientOutcome::Discharged(patient)) => discharged.push(patient),
                Ok(PatientOutcome::Failed {
                    patient,
                    stage,
                    error,
                }) => failed.push(FailedAdmission {
                    patient,
                    stage: Some(stage),
                    kind: error.kind(),
                    reason: error.to_string(),
                }),
                Err(join_error) => {
                    error!(patient_id = registered.id, error = %join_error, "admission unit aborted");
                    failed.push(FailedAdmission {
                        patient: registered,
                        stage: None,
                        kind: FailureKind::Aborted,
                        reason: join_error.to_string(),
                    });
                }
            }
        }
        watchdog.abort();

        let occupancy = self.ctx.manager.occupancy_report();
        info!(
            %run_id,
            discharged = discharged.len(),
            failed = failed.len(),
            beds_held = occupancy.total_held(),
            "batch finished"
        );
        BatchResult {
            run_id,
            discharged,
            failed,
            occupancy,
        }
    }
}
