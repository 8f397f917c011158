//! Patient record and the closed enumerations that drive bed placement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{stay_for, AdmissionError};

/// Patient identifier, unique within a batch.
pub type PatientId = u32;

/// Admission time window; selects the physician roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shift {
    /// Morning shift.
    Morning,
    /// Evening shift.
    Evening,
    /// Night shift.
    Night,
}

impl Shift {
    /// All shifts in roster order.
    pub const ALL: [Self; 3] = [Self::Morning, Self::Evening, Self::Night];

    /// Upper-case tag used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Morning => "MORNING",
            Self::Evening => "EVENING",
            Self::Night => "NIGHT",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bed category; one capacity pool per variant.
///
/// Declaration order is the fallback enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BedCategory {
    /// General obstetric bed.
    Obstetric,
    /// General gynecological bed.
    Gynecological,
    /// Intensive-care bed.
    IntensiveCare,
    /// Bereavement suite.
    Bereavement,
}

impl BedCategory {
    /// All categories in fallback order.
    pub const ALL: [Self; 4] = [
        Self::Obstetric,
        Self::Gynecological,
        Self::IntensiveCare,
        Self::Bereavement,
    ];

    /// Categories a routine admission is spread across.
    pub const GENERAL: [Self; 2] = [Self::Obstetric, Self::Gynecological];

    /// Upper-case tag used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Obstetric => "OBSTETRIC",
            Self::Gynecological => "GYNECOLOGICAL",
            Self::IntensiveCare => "INTENSIVE_CARE",
            Self::Bereavement => "BEREAVEMENT",
        }
    }
}

impl fmt::Display for BedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Emergency protocol classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Protocol {
    /// No emergency.
    #[default]
    Routine,
    /// Life-threatening maternal emergency.
    MaternalCritical,
    /// Pregnancy loss.
    FetalLoss,
}

impl Protocol {
    /// Classify a diagnosis label. Unrecognised labels are routine.
    #[must_use]
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("maternal critical") {
            Self::MaternalCritical
        } else if label.contains("fetal loss") {
            Self::FetalLoss
        } else {
            Self::Routine
        }
    }
}

/// Output of the diagnosis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Human-readable diagnosis label.
    pub label: String,
    /// Expected stay in day-units.
    pub stay_days: u32,
}

impl Diagnosis {
    /// Label used when the diagnosis service is unavailable.
    pub const FALLBACK_LABEL: &'static str = "routine gynecological review";

    /// Build a diagnosis.
    pub fn new(label: impl Into<String>, stay_days: u32) -> Self {
        Self {
            label: label.into(),
            stay_days,
        }
    }

    /// Degraded diagnosis applied when prediction fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(Self::FALLBACK_LABEL, 1)
    }
}

/// Mutable patient record, owned by its lifecycle until the outcome is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Unique identifier.
    pub id: PatientId,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u8,
    /// Presenting symptoms.
    pub symptoms: Vec<String>,
    /// Shift the patient was admitted on.
    pub shift: Shift,
    /// Diagnosis label, set once.
    pub diagnosis: Option<String>,
    /// Stay length in day-units, set together with the diagnosis.
    pub stay_days: u32,
    /// Emergency protocol; upgraded at most once from `Routine`.
    pub protocol: Protocol,
    /// Set when the protocol is upgraded to `MaternalCritical`.
    pub priority: bool,
    /// Bed category currently held by this patient.
    pub bed: Option<BedCategory>,
    /// Attending physician.
    pub physician: Option<String>,
    /// Assigned resident.
    pub resident: Option<String>,
    /// Specialist follow-up requested before discharge.
    pub needs_specialist: bool,
    /// Lifecycle completed successfully.
    pub discharged: bool,
}

impl Patient {
    /// Register a new patient.
    pub fn new(
        id: PatientId,
        name: impl Into<String>,
        age: u8,
        symptoms: Vec<String>,
        shift: Shift,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            symptoms,
            shift,
            diagnosis: None,
            stay_days: 0,
            protocol: Protocol::Routine,
            priority: false,
            bed: None,
            physician: None,
            resident: None,
            needs_specialist: false,
            discharged: false,
        }
    }

    /// Record the diagnosis and upgrade the protocol if the label calls for it.
    ///
    /// A zero stay means the service omitted one; the catalog length for the
    /// label is used instead, one day when the label is unknown.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if a diagnosis was already recorded.
    pub fn apply_diagnosis(&mut self, diagnosis: Diagnosis) -> Result<(), AdmissionError> {
        if self.diagnosis.is_some() {
            return Err(AdmissionError::InvariantViolation(format!(
                "{} already diagnosed",
                self.name
            )));
        }
        let protocol = Protocol::classify(&diagnosis.label);
        if self.protocol == Protocol::Routine && protocol != Protocol::Routine {
            self.protocol = protocol;
            self.priority = protocol == Protocol::MaternalCritical;
        }
        self.stay_days = match diagnosis.stay_days {
            0 => stay_for(&diagnosis.label),
            days => days,
        };
        self.diagnosis = Some(diagnosis.label);
        Ok(())
    }

    /// Whether the diagnosis calls for a follow-up consultation before discharge.
    #[must_use]
    pub fn requires_follow_up(&self) -> bool {
        self.protocol == Protocol::FetalLoss
            || self
                .diagnosis
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains("loss"))
    }
}
