//! Configuration models for bed capacities, rosters, timeouts and workers.

pub mod admission;

pub use admission::{AdmissionConfig, DiagnosisPoolConfig, FollowUpConfig};
