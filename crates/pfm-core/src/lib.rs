//! # PFM Simulation Core Library
//!
//! Brownian dynamics of a micron-sized probe bead that is tethered through a single
//! molecule to a fixed pedestal bead while one or two optical traps pull on it, as in a
//! photonic force microscopy (PFM) single-molecule pulling experiment.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Physical environment, tether energy models, the probe,
//!   pedestal and optical trap models, the double-bead assay energy landscape with its
//!   finite-difference forces, and file I/O for stimulus sequences and trajectories.
//!
//! - **[`engine`]: The Logic Core.** The overdamped Langevin integrator with hard-constraint
//!   rejection, the PFM driver with adaptive sub-stepping, configuration, errors and
//!   progress reporting.
//!
//! - **[`workflows`]: The Public API.** Turns an [`engine::config::ExperimentConfig`] into a
//!   finished trajectory in a single call.

pub mod core;
pub mod engine;
pub mod workflows;
