//! # Physical Object Models
//!
//! The objects that take part in a PFM experiment.
//!
//! - [`probe`] - The optically trapped probe bead, its drag and its tether attachment point
//! - [`pedestal`] - The fixed bead the tether is anchored to, with optional positional jitter
//! - [`trap`] - Harmonic optical traps and their stiffness drive protocols
//! - [`sequence`] - Binary stimulus sequences that drive a trap between two stiffness levels

pub mod pedestal;
pub mod probe;
pub mod sequence;
pub mod trap;
