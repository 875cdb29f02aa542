//! File input and output for simulation collaborators.
//!
//! Stimulus sequences are read from plain text files with one sample per line, and
//! trajectories are written as CSV tables with a header row. Both readers and writers
//! operate on generic `BufRead`/`Write` handles, with path-based convenience wrappers.

pub mod sequence;
pub mod trajectory;
