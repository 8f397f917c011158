//! Error types for admission operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by admission components.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// No bed category could be acquired within any timeout.
    #[error("no bed available for {patient}")]
    ResourceExhausted {
        /// Display name of the patient that could not be placed.
        patient: String,
    },
    /// The diagnosis service failed or could not be reached.
    #[error("diagnosis unavailable: {0}")]
    DiagnosisUnavailable(String),
    /// The follow-up service failed or could not be reached.
    #[error("follow-up unavailable: {0}")]
    FollowUpUnavailable(String),
    /// Accounting or state-machine invariant was broken.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// The unit of work was cancelled before it completed.
    #[error("cancelled during {0}")]
    Cancelled(String),
    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse failure classification carried in batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No bed within all timeouts.
    ResourceExhausted,
    /// Diagnosis service failure.
    DiagnosisUnavailable,
    /// Follow-up service failure.
    FollowUpUnavailable,
    /// Programming error surfaced at runtime.
    InvariantViolation,
    /// Deadline or explicit cancellation.
    Cancelled,
    /// Configuration problem.
    InvalidConfig,
    /// The unit of work panicked or was aborted by the runtime.
    Aborted,
}

impl AdmissionError {
    /// Classify this error for reporting.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::ResourceExhausted { .. } => FailureKind::ResourceExhausted,
            Self::DiagnosisUnavailable(_) => FailureKind::DiagnosisUnavailable,
            Self::FollowUpUnavailable(_) => FailureKind::FollowUpUnavailable,
            Self::InvariantViolation(_) => FailureKind::InvariantViolation,
            Self::Cancelled(_) => FailureKind::Cancelled,
            Self::InvalidConfig(_) => FailureKind::InvalidConfig,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
