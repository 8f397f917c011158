//! Builders to construct admission components from configuration.

pub mod ward_builder;

pub use ward_builder::{build_manager, build_orchestrator, build_simulated_orchestrator, selection_for};
