//! # Core Module
//!
//! Stateless building blocks of the PFM simulation.
//!
//! ## Architecture
//!
//! - **Physical Environment** ([`environment`]) - Boltzmann constant, temperature and viscosity
//! - **Tether Models** ([`tether`]) - Free-energy landscapes of the molecular linker
//! - **Physical Objects** ([`models`]) - Probe bead, pedestal bead, optical trap, stimulus sequence
//! - **Energy Landscape** ([`assay`]) - Tether plus hard-sphere exclusion, with finite-difference forces
//! - **File I/O** ([`io`]) - Stimulus sequence loading and trajectory output
//!
//! All lengths are in meters, energies in joules, forces in newtons and stiffnesses in N/m.

pub mod assay;
pub mod environment;
pub mod io;
pub mod models;
pub mod tether;
