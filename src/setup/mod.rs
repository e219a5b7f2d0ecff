//! Setup module for the tile-forge application.
//!
//! Wires the resolved settings to rule loading, the solver and the writers.

pub mod execution;
pub mod visualization;
