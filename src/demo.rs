//! Demo input generation.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::core::{Patient, PatientId, Shift};

/// Presenting symptom sets drawn from for demo patients.
pub const SYMPTOM_SETS: [&[&str]; 10] = [
    &["contractions", "ruptured membranes"],
    &["severe abdominal pain"],
    &["heavy vaginal bleeding"],
    &["high blood pressure", "blurred vision"],
    &["high fever", "general malaise"],
    &["dizziness", "weakness"],
    &["chronic pelvic pain"],
    &["postpartum follow-up"],
    &["prenatal check-up"],
    &["suspected ectopic pregnancy"],
];

/// Generate `count` patients named `Patient 1..=count`.
pub fn generate_patients<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Patient> {
    (1..=count)
        .map(|n| {
            let id = PatientId::try_from(n).unwrap_or(PatientId::MAX);
            let symptoms = SYMPTOM_SETS
                .choose(rng)
                .map(|set| set.iter().map(|s| (*s).to_string()).collect())
                .unwrap_or_default();
            let shift = Shift::ALL.choose(rng).copied().unwrap_or(Shift::Morning);
            Patient::new(id, format!("Patient {n}"), rng.random_range(18..=80), symptoms, shift)
        })
        .collect()
}
