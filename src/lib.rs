//! # Ward Admission
//!
//! Concurrent admission scheduler for a capacity-constrained maternity and
//! gynecology ward.
//!
//! Every patient runs as an independent unit of work through
//! diagnosis → bed assignment → stay → optional follow-up → discharge, while
//! competing for a small set of typed bed pools. The core guarantees:
//!
//! - **Bounded acquisition**: waiting for a bed is capped by a primary timeout
//!   on the preferred category and a secondary timeout per alternate
//! - **Fallback placement**: an exhausted preferred category falls back to the
//!   others in a fixed order
//! - **Consistent occupancy**: assignments, releases and reports share one
//!   mutual-exclusion domain per manager
//! - **No leaked beds**: a held bed is returned exactly once on discharge,
//!   failure, deadline cancellation or when the unit is dropped
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use ward_admission::builders::build_simulated_orchestrator;
//! use ward_admission::config::AdmissionConfig;
//! use ward_admission::demo::generate_patients;
//! use ward_admission::report::{Reporter, TextReporter};
//!
//! let cfg = AdmissionConfig::default();
//! let orchestrator = build_simulated_orchestrator(&cfg)?;
//! let patients = generate_patients(cfg.batch_size, &mut rand::rng());
//! let batch = orchestrator.run(patients).await;
//! println!("{}", TextReporter.render(&batch)?);
//! ```
//!
//! Diagnosis is CPU-bound and runs on [`crate::core::DiagnosisWorkers`], a pool of
//! dedicated OS threads, so a burst of predictions never starves bed waits.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct admission components from configuration.
pub mod builders;
/// Configuration models for capacities, rosters, timeouts and workers.
pub mod config;
/// Bed pools, allocation, diagnosis workers and patient lifecycles.
pub mod core;
/// Demo input generation.
pub mod demo;
/// Rendering of batch results.
pub mod report;
/// Shared utilities.
pub mod util;
