//! # Workflows Module
//!
//! High-level entry points that run a complete PFM experiment from an
//! [`ExperimentConfig`](crate::engine::config::ExperimentConfig).
//!
//! - **Simulation Workflow** ([`simulate`]) - Builds the probe, assay and traps, loads the
//!   stimulus sequence when one is configured, seeds the generator and runs the protocol.

pub mod simulate;
