//! Per-patient pipeline: diagnosis, bed assignment, stay, follow-up, discharge.
//!
//! Every suspension point races the unit's [`CancellationToken`]. The bed is
//! held by a [`BedAssignment`] guard, so whichever way the pipeline exits
//! (discharge, error, cancellation, or the future being dropped) the bed
//! goes back to its pool exactly once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{
    AdmissionError, BedAssignment, Diagnosis, DiagnosisWorkers, FollowUpService, Patient,
    ResourceManager,
};

/// Stage of a patient's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Admitted, not yet diagnosed.
    Registered,
    /// Diagnosis and stay length recorded.
    Diagnosed,
    /// Bed and staff assigned.
    ResourceAssigned,
    /// Stay in progress.
    InStay,
    /// Awaiting specialist follow-up.
    FollowUpPending,
    /// Released and discharged.
    Discharged,
    /// Pipeline aborted.
    Failed,
}

impl LifecycleState {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Discharged | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Registered, Self::Diagnosed)
            | (Self::Diagnosed, Self::ResourceAssigned)
            | (Self::ResourceAssigned, Self::InStay)
            | (Self::InStay, Self::FollowUpPending | Self::Discharged)
            | (Self::FollowUpPending, Self::Discharged) => true,
            (_, Self::Failed) => !self.is_terminal(),
            _ => false,
        }
    }
}

/// Collaborators shared by every lifecycle in a batch.
#[derive(Clone)]
pub struct LifecycleContext {
    /// Shared bed allocator.
    pub manager: Arc<ResourceManager>,
    /// Off-runtime diagnosis workers.
    pub diagnosis: Arc<DiagnosisWorkers>,
    /// Specialist follow-up service.
    pub follow_up: Arc<dyn FollowUpService>,
    /// Wall-clock length of one stay day.
    pub stay_step: Duration,
}

/// Final result of one lifecycle.
#[derive(Debug)]
pub enum PatientOutcome {
    /// Completed and discharged.
    Discharged(Patient),
    /// Aborted; the bed, if any, has been released.
    Failed {
        /// Patient record as of the failure.
        patient: Patient,
        /// Last stage reached before failing.
        stage: LifecycleState,
        /// Cause.
        error: AdmissionError,
    },
}

/// Drives one patient through the admission pipeline.
pub struct PatientLifecycle {
    ctx: LifecycleContext,
    patient: Patient,
    state: LifecycleState,
    cancel: CancellationToken,
}

impl PatientLifecycle {
    /// Create a lifecycle for a freshly registered patient.
    #[must_use]
    pub const fn new(ctx: LifecycleContext, patient: Patient, cancel: CancellationToken) -> Self {
        Self {
            ctx,
            patient,
            state: LifecycleState::Registered,
            cancel,
        }
    }

    /// Run the pipeline to completion or failure.
    pub async fn run(mut self) -> PatientOutcome {
        info!(
            patient_id = self.patient.id,
            name = %self.patient.name,
            age = self.patient.age,
            shift = %self.patient.shift,
            "admission started"
        );
        match self.drive().await {
            Ok(()) => {
                info!(patient_id = self.patient.id, "patient discharged");
                PatientOutcome::Discharged(self.patient)
            }
            Err(error) => {
                let stage = self.state;
                // The guard inside drive() has already returned the bed.
                self.patient.bed = None;
                self.state = LifecycleState::Failed;
                warn!(
                    patient_id = self.patient.id,
                    stage = ?stage,
                    error = %error,
                    "admission failed"
                );
                PatientOutcome::Failed {
                    patient: self.patient,
                    stage,
                    error,
                }
            }
        }
    }

    async fn drive(&mut self) -> Result<(), AdmissionError> {
        self.diagnose().await?;
        let assignment = self.assign().await?;
        self.stay().await?;
        if self.patient.requires_follow_up() {
            self.advance(LifecycleState::FollowUpPending)?;
            self.follow_up().await?;
        }
        self.discharge(assignment)
    }

    async fn diagnose(&mut self) -> Result<(), AdmissionError> {
        let symptoms = self.patient.symptoms.clone();
        let predicted = with_cancel(
            &self.cancel,
            "diagnosis",
            self.ctx.diagnosis.diagnose(self.patient.id, symptoms),
        )
        .await?;
        let diagnosis = predicted.unwrap_or_else(|e| {
            warn!(patient_id = self.patient.id, error = %e, "using fallback diagnosis");
            Diagnosis::fallback()
        });
        info!(
            patient_id = self.patient.id,
            diagnosis = %diagnosis.label,
            stay_days = diagnosis.stay_days,
            "diagnosed"
        );
        self.patient.apply_diagnosis(diagnosis)?;
        self.advance(LifecycleState::Diagnosed)
    }

    async fn assign(&mut self) -> Result<BedAssignment, AdmissionError> {
        let manager = Arc::clone(&self.ctx.manager);
        let assignment = with_cancel(
            &self.cancel,
            "bed assignment",
            manager.assign_resources(&mut self.patient),
        )
        .await??;
        self.advance(LifecycleState::ResourceAssigned)?;
        Ok(assignment)
    }

    async fn stay(&mut self) -> Result<(), AdmissionError> {
        self.advance(LifecycleState::InStay)?;
        for day in 1..=self.patient.stay_days {
            with_cancel(&self.cancel, "stay", tokio::time::sleep(self.ctx.stay_step)).await?;
            debug!(patient_id = self.patient.id, day, "stay day completed");
        }
        Ok(())
    }

    async fn follow_up(&mut self) -> Result<(), AdmissionError> {
        let evaluated = with_cancel(
            &self.cancel,
            "follow-up",
            self.ctx.follow_up.evaluate(&self.patient),
        )
        .await?;
        self.patient.needs_specialist = evaluated.unwrap_or_else(|e| {
            warn!(patient_id = self.patient.id, error = %e, "follow-up unavailable, no referral");
            false
        });
        Ok(())
    }

    fn discharge(&mut self, assignment: BedAssignment) -> Result<(), AdmissionError> {
        assignment.release()?;
        self.patient.bed = None;
        self.patient.discharged = true;
        self.advance(LifecycleState::Discharged)
    }

    fn advance(&mut self, next: LifecycleState) -> Result<(), AdmissionError> {
        if !self.state.can_advance_to(next) {
            return Err(AdmissionError::InvariantViolation(format!(
                "illegal transition {:?} -> {next:?}",
                self.state
            )));
        }
        debug!(patient_id = self.patient.id, from = ?self.state, to = ?next, "stage transition");
        self.state = next;
        Ok(())
    }
}

/// Race `fut` against cancellation of `token`.
async fn with_cancel<F: Future>(
    token: &CancellationToken,
    stage: &'static str,
    fut: F,
) -> Result<F::Output, AdmissionError> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(AdmissionError::Cancelled(stage.to_string())),
        out = fut => Ok(out),
    }
}
