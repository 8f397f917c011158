//! Fixed-capacity counting pool for a single bed category.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::{AdmissionError, BedCategory};

/// Counting pool for one bed category.
///
/// Uses a `parking_lot::Mutex` around the held counter and a
/// `parking_lot::Condvar` to park waiters until a unit is released.
/// Waiting only holds this pool's lock, never the manager's.
///
/// Acquire and release are crate-private; outside callers go through
/// [`ResourceManager`](crate::core::ResourceManager) so the pool never drifts
/// from the occupancy map.
#[derive(Debug)]
pub struct BedPool {
    category: BedCategory,
    capacity: u32,
    held: Mutex<u32>,
    available: Condvar,
}

impl BedPool {
    /// Create a pool with `capacity` units, none held.
    #[must_use]
    pub const fn new(category: BedCategory, capacity: u32) -> Self {
        Self {
            category,
            capacity,
            held: Mutex::new(0),
            available: Condvar::new(),
        }
    }

    /// Category served by this pool.
    #[must_use]
    pub const fn category(&self) -> BedCategory {
        self.category
    }

    /// Total units.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units currently held.
    #[must_use]
    pub fn held(&self) -> u32 {
        *self.held.lock()
    }

    /// Take one unit, blocking the calling thread for at most `timeout`.
    ///
    /// Returns `false` on timeout with no state change.
    pub(crate) fn try_acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock();
        while *held >= self.capacity {
            if self.available.wait_until(&mut held, deadline).timed_out() && *held >= self.capacity {
                return false;
            }
        }
        *held += 1;
        true
    }

    /// Return one unit and wake a single waiter.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if no unit is held.
    pub(crate) fn release(&self) -> Result<(), AdmissionError> {
        let mut held = self.held.lock();
        if *held == 0 {
            tracing::error!(category = %self.category, "release on empty pool");
            return Err(AdmissionError::InvariantViolation(format!(
                "release of {} with nothing held",
                self.category
            )));
        }
        *held -= 1;
        drop(held);
        self.available.notify_one();
        Ok(())
    }

    /// Async acquisition that parks on tokio's blocking pool.
    ///
    /// The unit comes back as a [`PoolPermit`]. If the awaiting future is
    /// dropped while the wait is still parked and the wait later succeeds,
    /// the permit is dropped by the runtime and the unit goes back.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the blocking task panicked.
    pub(crate) async fn acquire(self: &Arc<Self>, timeout: Duration) -> Result<Option<PoolPermit>, AdmissionError> {
        let pool = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            pool.try_acquire(timeout).then(|| PoolPermit { pool: Some(pool) })
        })
        .await
        .map_err(|e| AdmissionError::InvariantViolation(format!("bed acquisition task failed: {e}")))
    }
}

/// One held unit of a [`BedPool`]; returned to the pool on drop.
#[derive(Debug)]
pub struct PoolPermit {
    pool: Option<Arc<BedPool>>,
}

impl PoolPermit {
    /// Category of the held unit.
    #[must_use]
    pub fn category(&self) -> Option<BedCategory> {
        self.pool.as_ref().map(|p| p.category())
    }

    /// Hand the unit over to a longer-lived owner without releasing it.
    pub(crate) fn disarm(mut self) {
        self.pool = None;
    }
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            if let Err(e) = pool.release() {
                tracing::error!(error = %e, "failed to return pool permit");
            }
        }
    }
}
