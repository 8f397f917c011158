//! Diagnosis service abstraction and the simulated prediction model.

use std::ops::RangeInclusive;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{AdmissionError, Diagnosis};

/// Predicts a diagnosis from presenting symptoms.
///
/// Implementations are CPU-bound and run on the diagnosis worker threads,
/// never on the async runtime.
pub trait DiagnosisService: Send + Sync + 'static {
    /// Predict a diagnosis and expected stay.
    ///
    /// # Errors
    ///
    /// Returns `DiagnosisUnavailable` when no prediction can be produced.
    fn predict(&self, symptoms: &[String]) -> Result<Diagnosis, AdmissionError>;
}

/// One catalogued diagnosis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    /// Diagnosis label.
    pub label: &'static str,
    /// Stay length in day-units.
    pub stay_days: u32,
    /// Relative likelihood used by the simulated model.
    pub weight: f64,
}

/// Known diagnoses with their stay lengths.
pub const DIAGNOSIS_CATALOG: [CatalogEntry; 10] = [
    CatalogEntry { label: "natural delivery", stay_days: 2, weight: 2.0 },
    CatalogEntry { label: "scheduled cesarean section", stay_days: 4, weight: 1.5 },
    CatalogEntry { label: "obstetric emergency (maternal critical)", stay_days: 6, weight: 1.0 },
    CatalogEntry { label: "fetal loss", stay_days: 3, weight: 1.0 },
    CatalogEntry { label: "postpartum complication", stay_days: 5, weight: 1.0 },
    CatalogEntry { label: "spontaneous miscarriage", stay_days: 2, weight: 1.0 },
    CatalogEntry { label: "routine prenatal check", stay_days: 1, weight: 1.0 },
    CatalogEntry { label: "gynecological surgery (myomectomy)", stay_days: 4, weight: 1.0 },
    CatalogEntry { label: "gynecological surgery (hysterectomy)", stay_days: 5, weight: 1.0 },
    CatalogEntry { label: "routine gynecological review", stay_days: 1, weight: 1.0 },
];

/// Stay length for a catalogued label; one day for anything unknown.
#[must_use]
pub fn stay_for(label: &str) -> u32 {
    DIAGNOSIS_CATALOG
        .iter()
        .find(|e| e.label.eq_ignore_ascii_case(label))
        .map_or(1, |e| e.stay_days)
}

/// Weighted random prediction over [`DIAGNOSIS_CATALOG`] after a simulated
/// think time. Symptoms do not influence the outcome.
pub struct SimulatedDiagnosisModel {
    think_ms: RangeInclusive<u64>,
    weights: WeightedIndex<f64>,
    rng: Mutex<StdRng>,
}

impl SimulatedDiagnosisModel {
    /// Create a model with think time drawn from `think_ms`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the catalog weights are unusable.
    pub fn new(think_ms: RangeInclusive<u64>, seed: Option<u64>) -> Result<Self, AdmissionError> {
        let weights = WeightedIndex::new(DIAGNOSIS_CATALOG.iter().map(|e| e.weight))
            .map_err(|e| AdmissionError::InvalidConfig(format!("diagnosis weights: {e}")))?;
        let rng = seed.map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);
        Ok(Self {
            think_ms,
            weights,
            rng: Mutex::new(rng),
        })
    }
}

impl DiagnosisService for SimulatedDiagnosisModel {
    fn predict(&self, symptoms: &[String]) -> Result<Diagnosis, AdmissionError> {
        let (think, idx) = {
            let mut rng = self.rng.lock();
            let think = if self.think_ms.is_empty() {
                0
            } else {
                rng.random_range(self.think_ms.clone())
            };
            (think, self.weights.sample(&mut *rng))
        };
        thread::sleep(Duration::from_millis(think));

        let entry = DIAGNOSIS_CATALOG.get(idx).ok_or_else(|| {
            AdmissionError::DiagnosisUnavailable(format!("model produced unknown class {idx}"))
        })?;
        tracing::debug!(?symptoms, label = entry.label, "diagnosis predicted");
        Ok(Diagnosis::new(entry.label, entry.stay_days))
    }
}

/// Always fails; exercises the degraded-diagnosis path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDiagnosis;

impl DiagnosisService for UnavailableDiagnosis {
    fn predict(&self, _symptoms: &[String]) -> Result<Diagnosis, AdmissionError> {
        Err(AdmissionError::DiagnosisUnavailable("model offline".into()))
    }
}

/// Returns the same diagnosis for every patient.
#[derive(Debug, Clone)]
pub struct FixedDiagnosis(pub Diagnosis);

impl DiagnosisService for FixedDiagnosis {
    fn predict(&self, _symptoms: &[String]) -> Result<Diagnosis, AdmissionError> {
        Ok(self.0.clone())
    }
}
