//! Specialist follow-up consultation.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::FollowUpConfig;
use crate::core::{AdmissionError, Patient, Protocol};

/// Diagnoses that always warrant a specialist.
pub const SPECIALIST_DIAGNOSES: [&str; 4] = [
    "fetal loss",
    "spontaneous miscarriage",
    "obstetric emergency (maternal critical)",
    "postpartum complication",
];

/// Decides whether a patient needs specialist follow-up before discharge.
#[async_trait]
pub trait FollowUpService: Send + Sync + 'static {
    /// Evaluate a patient snapshot.
    ///
    /// # Errors
    ///
    /// Returns `FollowUpUnavailable` when the consultation cannot be made.
    async fn evaluate(&self, patient: &Patient) -> Result<bool, AdmissionError>;
}

/// Simulated consultation with latency and a baseline referral rate.
pub struct SimulatedFollowUp {
    config: FollowUpConfig,
    rng: Mutex<StdRng>,
}

impl SimulatedFollowUp {
    /// Create a simulated service.
    #[must_use]
    pub fn new(config: FollowUpConfig, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);
        Self {
            config,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl FollowUpService for SimulatedFollowUp {
    async fn evaluate(&self, patient: &Patient) -> Result<bool, AdmissionError> {
        let (latency, roll) = {
            let mut rng = self.rng.lock();
            let latency = if self.config.latency_min_ms >= self.config.latency_max_ms {
                self.config.latency_min_ms
            } else {
                rng.random_range(self.config.latency_min_ms..=self.config.latency_max_ms)
            };
            (latency, rng.random::<f64>())
        };
        tokio::time::sleep(Duration::from_millis(latency)).await;

        let listed = patient
            .diagnosis
            .as_deref()
            .is_some_and(|d| SPECIALIST_DIAGNOSES.iter().any(|s| s.eq_ignore_ascii_case(d)));
        let needs = patient.protocol == Protocol::FetalLoss
            || listed
            || roll < self.config.baseline_probability;

        tracing::info!(patient_id = patient.id, needs_specialist = needs, "follow-up evaluated");
        Ok(needs)
    }
}

/// Always fails; exercises the fail-safe follow-up path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableFollowUp;

#[async_trait]
impl FollowUpService for UnavailableFollowUp {
    async fn evaluate(&self, _patient: &Patient) -> Result<bool, AdmissionError> {
        Err(AdmissionError::FollowUpUnavailable("consultation service offline".into()))
    }
}
