//! Rendering of batch results.

use std::fmt::Write as _;

use crate::core::{AppResult, BatchResult};

/// Renders a finished batch for humans or machines.
pub trait Reporter {
    /// Render the batch.
    ///
    /// # Errors
    ///
    /// Returns an error when the output cannot be produced.
    fn render(&self, batch: &BatchResult) -> AppResult<String>;
}

/// Plain-text summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextReporter;

impl Reporter for TextReporter {
    fn render(&self, batch: &BatchResult) -> AppResult<String> {
        let mut out = String::new();
        writeln!(out, "=== ADMISSION SUMMARY ({}) ===", batch.run_id)?;

        writeln!(out, "\nDischarged patients: {}", batch.discharged_count())?;
        for patient in &batch.discharged {
            writeln!(
                out,
                "- {}: {} (stay: {} days){}",
                patient.name,
                patient.diagnosis.as_deref().unwrap_or("undiagnosed"),
                patient.stay_days,
                if patient.needs_specialist { " [specialist referral]" } else { "" }
            )?;
        }

        if !batch.failed.is_empty() {
            writeln!(out, "\nIncomplete admissions: {}", batch.failed_count())?;
            for failure in &batch.failed {
                let stage = failure
                    .stage
                    .map_or_else(|| "unknown stage".to_string(), |s| format!("{s:?}"));
                writeln!(out, "- {}: {} ({stage})", failure.patient.name, failure.reason)?;
            }
        }

        writeln!(out, "\nBed occupancy:")?;
        for entry in &batch.occupancy.categories {
            writeln!(
                out,
                "{}: {} occupied | {} available | {} total",
                entry.category, entry.held, entry.remaining, entry.capacity
            )?;
        }
        Ok(out)
    }
}

/// Pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn render(&self, batch: &BatchResult) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(batch)?)
    }
}
