//! Dedicated OS-thread pool for CPU-bound diagnosis work.
//!
//! Diagnosis runs on its own threads so that a burst of predictions never
//! starves the async runtime that drives bed waits and stays.
//!
//! # Design
//!
//! - **No polling**: workers block on a bounded `crossbeam-channel`; each job
//!   carries a `tokio::sync::oneshot` for its result
//! - **Clean shutdown**: dropping the sender unblocks idle workers
//! - **Panic isolation**: a panicking prediction is reported as
//!   `DiagnosisUnavailable` and the worker keeps serving

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::DiagnosisPoolConfig;
use crate::core::{AdmissionError, Diagnosis, DiagnosisService, PatientId};

/// Statistics about diagnosis pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Jobs accepted into the queue.
    pub submitted: u64,
    /// Jobs that produced a diagnosis.
    pub completed: u64,
    /// Jobs that failed or panicked.
    pub failed: u64,
    /// Jobs refused because the queue was full or the pool was closed.
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct PoolCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

impl PoolCounters {
    fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

struct DiagnosisJob {
    patient_id: PatientId,
    symptoms: Vec<String>,
    reply: oneshot::Sender<Result<Diagnosis, AdmissionError>>,
}

/// Worker pool that runs a [`DiagnosisService`] on dedicated threads.
pub struct DiagnosisWorkers {
    config: DiagnosisPoolConfig,
    job_tx: Mutex<Option<Sender<DiagnosisJob>>>,
    counters: Arc<PoolCounters>,
    shutdown: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl DiagnosisWorkers {
    /// Spawn `config.worker_count` threads serving `service`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is invalid or a thread
    /// cannot be spawned.
    pub fn new(
        config: DiagnosisPoolConfig,
        service: Arc<dyn DiagnosisService>,
    ) -> Result<Self, AdmissionError> {
        config.validate().map_err(AdmissionError::InvalidConfig)?;

        let (job_tx, job_rx) = bounded::<DiagnosisJob>(config.max_queue_depth);
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                worker_id,
                job_rx.clone(),
                Arc::clone(&service),
                Arc::clone(&counters),
                config.thread_stack_size,
            )
            .map_err(|e| AdmissionError::InvalidConfig(format!("spawn diagnosis worker: {e}")))?;
            workers.push(worker);
        }

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            "diagnosis worker pool initialized"
        );

        Ok(Self {
            config,
            job_tx: Mutex::new(Some(job_tx)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
        })
    }

    /// Run a prediction on a worker thread and await the result.
    ///
    /// # Errors
    ///
    /// Returns `DiagnosisUnavailable` if the queue is full, the pool is shut
    /// down, the worker panicked or the service itself failed.
    pub async fn diagnose(
        &self,
        patient_id: PatientId,
        symptoms: Vec<String>,
    ) -> Result<Diagnosis, AdmissionError> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(DiagnosisJob {
            patient_id,
            symptoms,
            reply,
        })?;
        rx.await.map_err(|_| {
            AdmissionError::DiagnosisUnavailable("diagnosis worker dropped the job".into())
        })?
    }

    fn enqueue(&self, job: DiagnosisJob) -> Result<(), AdmissionError> {
        if self.shutdown.load(Ordering::Acquire) {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(AdmissionError::DiagnosisUnavailable("pool shut down".into()));
        }
        let guard = self.job_tx.lock();
        let Some(tx) = guard.as_ref() else {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(AdmissionError::DiagnosisUnavailable("pool shut down".into()));
        };
        match tx.try_send(job) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(job)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(patient_id = job.patient_id, "diagnosis queue is full");
                Err(AdmissionError::DiagnosisUnavailable("queue full".into()))
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(AdmissionError::DiagnosisUnavailable("pool shut down".into()))
            }
        }
    }

    /// Current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Stop accepting work and join the workers.
    ///
    /// Jobs already queued are still served before the workers exit.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("shutting down diagnosis workers");
        self.job_tx.lock().take();

        let mut workers = self.workers.lock();
        for (idx, worker) in workers.drain(..).enumerate() {
            if worker.join().is_err() {
                warn!(worker_id = idx, "diagnosis worker panicked");
            }
        }
    }
}

impl Drop for DiagnosisWorkers {
    fn drop(&mut self) {
        // Detach rather than join; explicit shutdown() joins.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.job_tx.lock().take();
            debug!("diagnosis workers dropped without explicit shutdown");
        }
    }
}

fn spawn_worker(
    worker_id: usize,
    job_rx: Receiver<DiagnosisJob>,
    service: Arc<dyn DiagnosisService>,
    counters: Arc<PoolCounters>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("ward-diagnosis-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id, "diagnosis worker started");
            while let Ok(job) = job_rx.recv() {
                let outcome = catch_unwind(AssertUnwindSafe(|| service.predict(&job.symptoms)))
                    .unwrap_or_else(|_| {
                        Err(AdmissionError::DiagnosisUnavailable(
                            "diagnosis service panicked".into(),
                        ))
                    });
                if outcome.is_ok() {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                } else {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                }
                if job.reply.send(outcome).is_err() {
                    debug!(worker_id, patient_id = job.patient_id, "diagnosis requester went away");
                }
            }
            debug!(worker_id, "diagnosis worker exiting");
        })
}
