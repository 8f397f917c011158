//! Bed allocation across categories, staff assignment and occupancy accounting.
//!
//! Each category is backed by its own [`BedPool`]; waiting for a bed only
//! touches that pool's lock. The manager's own mutex covers the occupancy
//! map, staff selection and the patient record update, so an
//! [`OccupancyReport`] never interleaves with a half-finished assignment or
//! release.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::audit::{build_audit_event, AuditAction, AuditEvent, AuditSink};
use crate::core::{
    AdmissionError, BedCategory, BedPool, Patient, PatientId, PoolPermit, Protocol,
    SelectionPolicy, Shift,
};

/// Physician roster per shift plus the shared resident list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffRoster {
    /// Physicians on call for each shift.
    pub physicians: BTreeMap<Shift, Vec<String>>,
    /// Residents available on every shift.
    pub residents: Vec<String>,
}

impl StaffRoster {
    /// Ensure every shift has at least one physician and there is a resident.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the empty roster.
    pub fn validate(&self) -> Result<(), AdmissionError> {
        for shift in Shift::ALL {
            if self.physicians.get(&shift).is_none_or(Vec::is_empty) {
                return Err(AdmissionError::InvalidConfig(format!(
                    "no physicians rostered for {shift}"
                )));
            }
        }
        if self.residents.is_empty() {
            return Err(AdmissionError::InvalidConfig("resident roster is empty".into()));
        }
        Ok(())
    }
}

/// Wait budgets for bed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionTimeouts {
    /// Wait on the preferred category.
    pub primary: Duration,
    /// Wait on each alternate category.
    pub secondary: Duration,
}

/// Preferred bed category for a protocol.
///
/// Routine admissions are spread uniformly over the general categories
/// through `selection`.
pub fn preferred_category(protocol: Protocol, selection: &dyn SelectionPolicy) -> BedCategory {
    match protocol {
        Protocol::FetalLoss => BedCategory::Bereavement,
        Protocol::MaternalCritical => BedCategory::IntensiveCare,
        Protocol::Routine => {
            let idx = selection.pick(BedCategory::GENERAL.len());
            BedCategory::GENERAL
                .get(idx)
                .copied()
                .unwrap_or(BedCategory::Obstetric)
        }
    }
}

/// Occupancy of one category at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOccupancy {
    /// Category.
    pub category: BedCategory,
    /// Configured capacity.
    pub capacity: u32,
    /// Beds currently assigned.
    pub held: u32,
    /// Beds still free.
    pub remaining: u32,
}

/// Consistent occupancy snapshot across all categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyReport {
    /// One entry per category, in enumeration order.
    pub categories: Vec<CategoryOccupancy>,
}

impl OccupancyReport {
    /// Entry for a single category.
    #[must_use]
    pub fn get(&self, category: BedCategory) -> Option<&CategoryOccupancy> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// Held count for a category (zero when unknown).
    #[must_use]
    pub fn held(&self, category: BedCategory) -> u32 {
        self.get(category).map_or(0, |c| c.held)
    }

    /// Beds held across all categories.
    #[must_use]
    pub fn total_held(&self) -> u32 {
        self.categories.iter().map(|c| c.held).sum()
    }
}

/// Owns the bed pools, staff rosters and occupancy map.
pub struct ResourceManager {
    pools: BTreeMap<BedCategory, Arc<BedPool>>,
    roster: StaffRoster,
    timeouts: AcquisitionTimeouts,
    selection: Arc<dyn SelectionPolicy>,
    occupancy: Mutex<BTreeMap<BedCategory, u32>>,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("pools", &self.pools)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl ResourceManager {
    /// Create a manager with one pool per category.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a category is missing or has zero capacity,
    /// or if a roster is empty.
    pub fn new(
        capacities: &BTreeMap<BedCategory, u32>,
        roster: StaffRoster,
        timeouts: AcquisitionTimeouts,
        selection: Arc<dyn SelectionPolicy>,
    ) -> Result<Self, AdmissionError> {
        roster.validate()?;
        let mut pools = BTreeMap::new();
        let mut occupancy = BTreeMap::new();
        for category in BedCategory::ALL {
            let capacity = capacities.get(&category).copied().unwrap_or(0);
            if capacity == 0 {
                return Err(AdmissionError::InvalidConfig(format!(
                    "capacity for {category} must be greater than 0"
                )));
            }
            pools.insert(category, Arc::new(BedPool::new(category, capacity)));
            occupancy.insert(category, 0);
        }
        info!(?capacities, "resource manager initialized");
        Ok(Self {
            pools,
            roster,
            timeouts,
            selection,
            occupancy: Mutex::new(occupancy),
            audit: None,
        })
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Mutex::new(audit));
        self
    }

    /// Configured acquisition timeouts.
    #[must_use]
    pub const fn timeouts(&self) -> AcquisitionTimeouts {
        self.timeouts
    }

    /// Snapshot of recorded audit events (empty without a sink).
    #[must_use]
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit
            .as_ref()
            .map(|sink| sink.lock().events())
            .unwrap_or_default()
    }

    pub(crate) fn pool(&self, category: BedCategory) -> Result<&Arc<BedPool>, AdmissionError> {
        self.pools
            .get(&category)
            .ok_or_else(|| AdmissionError::InvariantViolation(format!("no pool for {category}")))
    }

    /// Units currently taken from the category's pool.
    ///
    /// Unlike [`OccupancyReport`], this includes units held by waiters that
    /// have not been committed to a patient yet.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the category has no pool.
    pub fn pool_held(&self, category: BedCategory) -> Result<u32, AdmissionError> {
        self.pool(category).map(|pool| pool.held())
    }

    /// Acquire a bed for the patient and assign staff.
    ///
    /// Waits `primary` on the preferred category, then `secondary` on each
    /// other category in enumeration order. On success the patient record
    /// carries the bed, physician and resident, and the returned guard gives
    /// the bed back when released or dropped.
    ///
    /// # Errors
    ///
    /// - `ResourceExhausted` if no category could be acquired.
    /// - `InvariantViolation` if the patient already holds a bed.
    pub async fn assign_resources(
        self: &Arc<Self>,
        patient: &mut Patient,
    ) -> Result<BedAssignment, AdmissionError> {
        if let Some(held) = patient.bed {
            return Err(AdmissionError::InvariantViolation(format!(
                "{} already holds a {held} bed",
                patient.name
            )));
        }

        let preferred = preferred_category(patient.protocol, self.selection.as_ref());
        let (category, permit) = match self.pool(preferred)?.acquire(self.timeouts.primary).await? {
            Some(permit) => (preferred, permit),
            None => {
                warn!(
                    patient_id = patient.id,
                    category = %preferred,
                    "preferred category unavailable, trying alternates"
                );
                self.record(patient.id, Some(preferred), AuditAction::Fallback, None);
                match self.acquire_alternate(preferred).await? {
                    Some(found) => found,
                    None => {
                        warn!(patient_id = patient.id, "no bed available in any category");
                        self.record(patient.id, None, AuditAction::Exhausted, None);
                        return Err(AdmissionError::ResourceExhausted {
                            patient: patient.name.clone(),
                        });
                    }
                }
            }
        };

        self.commit(patient, category, permit)
    }

    /// Try every category except `preferred`, in enumeration order.
    async fn acquire_alternate(
        &self,
        preferred: BedCategory,
    ) -> Result<Option<(BedCategory, PoolPermit)>, AdmissionError> {
        for category in BedCategory::ALL.into_iter().filter(|c| *c != preferred) {
            if let Some(permit) = self.pool(category)?.acquire(self.timeouts.secondary).await? {
                return Ok(Some((category, permit)));
            }
        }
        Ok(None)
    }

    /// Record the held unit against the patient under the manager lock.
    fn commit(
        self: &Arc<Self>,
        patient: &mut Patient,
        category: BedCategory,
        permit: PoolPermit,
    ) -> Result<BedAssignment, AdmissionError> {
        let mut occupancy = self.occupancy.lock();

        let physicians = self
            .roster
            .physicians
            .get(&patient.shift)
            .map_or(&[][..], Vec::as_slice);
        let physician = physicians
            .get(self.selection.pick(physicians.len()))
            .cloned()
            .ok_or_else(|| {
                AdmissionError::InvariantViolation(format!("no physician for {}", patient.shift))
            })?;
        let resident = self
            .roster
            .residents
            .get(self.selection.pick(self.roster.residents.len()))
            .cloned()
            .ok_or_else(|| AdmissionError::InvariantViolation("no resident available".into()))?;

        *occupancy.entry(category).or_insert(0) += 1;
        permit.disarm();
        patient.bed = Some(category);
        patient.physician = Some(physician.clone());
        patient.resident = Some(resident.clone());
        drop(occupancy);

        info!(
            patient_id = patient.id,
            category = %category,
            physician = %physician,
            resident = %resident,
            "bed assigned"
        );
        self.record(
            patient.id,
            Some(category),
            AuditAction::Assign,
            Some(format!("{physician} / {resident}")),
        );

        Ok(BedAssignment {
            manager: Arc::clone(self),
            patient_id: patient.id,
            category,
            physician,
            resident,
            released: false,
        })
    }

    /// Return one bed of `category` to its pool.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if no bed of that category is assigned.
    pub fn release_resource(&self, category: BedCategory) -> Result<(), AdmissionError> {
        self.release_for(None, category)
    }

    fn release_for(
        &self,
        patient_id: Option<PatientId>,
        category: BedCategory,
    ) -> Result<(), AdmissionError> {
        let mut occupancy = self.occupancy.lock();
        let held = occupancy.entry(category).or_insert(0);
        if *held == 0 {
            error!(category = %category, ?patient_id, "release with zero occupancy");
            return Err(AdmissionError::InvariantViolation(format!(
                "release of {category} with zero occupancy"
            )));
        }
        self.pool(category)?.release()?;
        *held -= 1;
        drop(occupancy);

        info!(category = %category, ?patient_id, "bed released");
        self.record_opt(patient_id, Some(category), AuditAction::Release, None);
        Ok(())
    }

    /// Consistent per-category occupancy snapshot.
    #[must_use]
    pub fn occupancy_report(&self) -> OccupancyReport {
        let occupancy = self.occupancy.lock();
        let categories = self
            .pools
            .iter()
            .map(|(category, pool)| {
                let held = occupancy.get(category).copied().unwrap_or(0);
                CategoryOccupancy {
                    category: *category,
                    capacity: pool.capacity(),
                    held,
                    remaining: pool.capacity().saturating_sub(held),
                }
            })
            .collect();
        OccupancyReport { categories }
    }

    fn record(
        &self,
        patient_id: PatientId,
        category: Option<BedCategory>,
        action: AuditAction,
        detail: Option<String>,
    ) {
        self.record_opt(Some(patient_id), category, action, detail);
    }

    fn record_opt(
        &self,
        patient_id: Option<PatientId>,
        category: Option<BedCategory>,
        action: AuditAction,
        detail: Option<String>,
    ) {
        if let Some(sink) = &self.audit {
            sink.lock()
                .record(build_audit_event(patient_id, category, action, detail));
        }
    }
}

/// A bed held on behalf of one patient.
///
/// Gives the bed back exactly once: through [`BedAssignment::release`] or,
/// on any other exit path, when dropped.
#[derive(Debug)]
pub struct BedAssignment {
    manager: Arc<ResourceManager>,
    patient_id: PatientId,
    category: BedCategory,
    physician: String,
    resident: String,
    released: bool,
}

impl BedAssignment {
    /// Assigned category.
    #[must_use]
    pub const fn category(&self) -> BedCategory {
        self.category
    }

    /// Assigned physician.
    #[must_use]
    pub fn physician(&self) -> &str {
        &self.physician
    }

    /// Assigned resident.
    #[must_use]
    pub fn resident(&self) -> &str {
        &self.resident
    }

    /// Release the bed now.
    ///
    /// # Errors
    ///
    /// Propagates `InvariantViolation` from the manager.
    pub fn release(mut self) -> Result<(), AdmissionError> {
        self.released = true;
        self.manager.release_for(Some(self.patient_id), self.category)
    }
}

impl Drop for BedAssignment {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        warn!(
            patient_id = self.patient_id,
            category = %self.category,
            "releasing bed on unwind"
        );
        if let Err(e) = self.manager.release_for(Some(self.patient_id), self.category) {
            error!(patient_id = self.patient_id, error = %e, "bed release failed during cleanup");
        }
    }
}
