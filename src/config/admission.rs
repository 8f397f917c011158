//! Admission configuration structures.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{AcquisitionTimeouts, BedCategory, Shift, StaffRoster};

/// Environment variable overriding the batch size.
pub const ENV_BATCH_SIZE: &str = "WARD_BATCH_SIZE";
/// Environment variable overriding the batch deadline in milliseconds.
pub const ENV_DEADLINE_MS: &str = "WARD_DEADLINE_MS";
/// Environment variable fixing the random seed.
pub const ENV_SEED: &str = "WARD_SEED";

/// Diagnosis worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisPoolConfig {
    /// Dedicated worker threads.
    pub worker_count: usize,
    /// Jobs that may wait for a worker before submissions are refused.
    pub max_queue_depth: usize,
    /// Stack size for each worker thread, in bytes.
    pub thread_stack_size: usize,
    /// Lower bound of the simulated think time.
    pub think_min_ms: u64,
    /// Upper bound of the simulated think time.
    pub think_max_ms: u64,
}

impl Default for DiagnosisPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().clamp(1, 4),
            max_queue_depth: 256,
            thread_stack_size: 2 * 1024 * 1024,
            think_min_ms: 100,
            think_max_ms: 500,
        }
    }
}

impl DiagnosisPoolConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the maximum queue depth.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Set the simulated think-time range.
    #[must_use]
    pub const fn with_think_time(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.think_min_ms = min_ms;
        self.think_max_ms = max_ms;
        self
    }

    /// Validate worker pool values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        if self.think_min_ms > self.think_max_ms {
            return Err("think_min_ms must not exceed think_max_ms".into());
        }
        Ok(())
    }
}

/// Simulated follow-up consultation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUpConfig {
    /// Lower bound of consultation latency.
    pub latency_min_ms: u64,
    /// Upper bound of consultation latency.
    pub latency_max_ms: u64,
    /// Chance of a referral for patients not otherwise flagged.
    pub baseline_probability: f64,
}

impl Default for FollowUpConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: 100,
            latency_max_ms: 500,
            baseline_probability: 0.3,
        }
    }
}

/// Root admission configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Beds per category.
    pub capacities: BTreeMap<BedCategory, u32>,
    /// Physicians on call per shift.
    pub physicians: BTreeMap<Shift, Vec<String>>,
    /// Residents shared by all shifts.
    pub residents: Vec<String>,
    /// Wait on the preferred category.
    pub primary_timeout_ms: u64,
    /// Wait on each alternate category.
    pub secondary_timeout_ms: u64,
    /// Wall-clock length of one stay day.
    pub stay_step_ms: u64,
    /// Patients admitted per batch.
    pub batch_size: usize,
    /// Global batch deadline.
    pub deadline_ms: u64,
    /// Diagnosis worker settings.
    pub diagnosis: DiagnosisPoolConfig,
    /// Follow-up consultation settings.
    pub follow_up: FollowUpConfig,
    /// Seed for every random decision; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        let capacities = BTreeMap::from([
            (BedCategory::Obstetric, 10),
            (BedCategory::Gynecological, 5),
            (BedCategory::IntensiveCare, 3),
            (BedCategory::Bereavement, 2),
        ]);
        let physicians = BTreeMap::from([
            (Shift::Morning, vec!["Dr. Esquivel".into(), "Dr. Uriostegui".into()]),
            (Shift::Evening, vec!["Dr. Connor".into(), "Dr. Sanchez".into()]),
            (Shift::Night, vec!["Dr. Gamez".into(), "Dr. Herrera".into()]),
        ]);
        Self {
            capacities,
            physicians,
            residents: vec![
                "Resident Garcia".into(),
                "Resident Lerin".into(),
                "Resident Murillo".into(),
                "Resident Anorve".into(),
            ],
            primary_timeout_ms: 30_000,
            secondary_timeout_ms: 10_000,
            stay_step_ms: 500,
            batch_size: 15,
            deadline_ms: 300_000,
            diagnosis: DiagnosisPoolConfig::default(),
            follow_up: FollowUpConfig::default(),
            seed: None,
        }
    }
}

impl AdmissionConfig {
    /// Validate all values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        for category in BedCategory::ALL {
            match self.capacities.get(&category) {
                None => return Err(format!("capacity for {category} is missing")),
                Some(0) => return Err(format!("capacity for {category} must be greater than 0")),
                Some(_) => {}
            }
        }
        self.roster().validate().map_err(|e| e.to_string())?;
        if self.primary_timeout_ms == 0 || self.secondary_timeout_ms == 0 {
            return Err("acquisition timeouts must be greater than 0".into());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".into());
        }
        if self.deadline_ms == 0 {
            return Err("deadline_ms must be greater than 0".into());
        }
        if !(0.0..=1.0).contains(&self.follow_up.baseline_probability) {
            return Err("follow_up.baseline_probability must be within [0, 1]".into());
        }
        if self.follow_up.latency_min_ms > self.follow_up.latency_max_ms {
            return Err("follow_up.latency_min_ms must not exceed latency_max_ms".into());
        }
        self.diagnosis
            .validate()
            .map_err(|e| format!("diagnosis invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an I/O, parse or validation message.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json_str(&input)
    }

    /// Apply `WARD_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a message naming the malformed variable.
    pub fn apply_env_overrides(&mut self) -> Result<(), String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `WARD_*` overrides from an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns a message naming the malformed variable.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), String> {
        if let Some(value) = lookup(ENV_BATCH_SIZE) {
            self.batch_size = parse_var(ENV_BATCH_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_DEADLINE_MS) {
            self.deadline_ms = parse_var(ENV_DEADLINE_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            self.seed = Some(parse_var(ENV_SEED, &value)?);
        }
        self.validate()
    }

    /// Staff roster view.
    #[must_use]
    pub fn roster(&self) -> StaffRoster {
        StaffRoster {
            physicians: self.physicians.clone(),
            residents: self.residents.clone(),
        }
    }

    /// Acquisition timeouts.
    #[must_use]
    pub const fn timeouts(&self) -> AcquisitionTimeouts {
        AcquisitionTimeouts {
            primary: Duration::from_millis(self.primary_timeout_ms),
            secondary: Duration::from_millis(self.secondary_timeout_ms),
        }
    }

    /// Stay pacing step.
    #[must_use]
    pub const fn stay_step(&self) -> Duration {
        Duration::from_millis(self.stay_step_ms)
    }

    /// Batch deadline.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{name}={value:?} is invalid: {e}"))
}
