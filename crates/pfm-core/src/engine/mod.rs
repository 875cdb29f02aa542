//! # Engine Module
//!
//! Stateful Brownian-dynamics simulation of a tethered probe bead in optical traps.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Simulation and experiment parameters with validating builders
//! - **Integration** ([`integrator`]) - Overdamped Langevin steps with hard-constraint rejection
//! - **Driver** ([`pfm`]) - Force composition, adaptive sub-stepping and the run modes
//! - **Output** ([`trajectory`]) - Dense per-step sample table
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Aggregated engine error type
//!
//! All mutable state of a run is owned by one [`pfm::PhotonicForceMicroscope`], and all
//! randomness flows from a single caller-supplied generator, so a fixed seed reproduces
//! a run exactly.

pub mod config;
pub mod error;
pub mod integrator;
pub mod pfm;
pub mod progress;
pub mod trajectory;
