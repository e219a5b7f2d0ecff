//! Core library for the voxel Wave Function Collapse solver.
//!
//! Holds the wave grid, the entropy-guided observer, the constraint
//! propagator, the per-attempt run loop with its retry controller, and the
//! mapping of a solved grid to placement records.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use wfc_rules::TileSetError;

/// Entropy model over action weights.
pub mod entropy;
/// Generic 3D grid storage and boundary handling.
pub mod grid;
/// Lowest-entropy cell selection and weighted collapse.
pub mod observer;
/// Mapping of solved grids to placement records.
pub mod output;
/// Constraint propagation logic and traits.
pub mod propagator;
/// Injectable random sources.
pub mod random;
/// Run loop and retry controller.
pub mod runner;
/// Per-cell domains and dirty tracking.
pub mod wave;

pub use crate::entropy::EntropyModel;
pub use crate::grid::{Boundaries, Grid};
pub use crate::observer::{weighted_random, Observation};
pub use crate::output::{map_resolved, map_wave, text_output, PlacementRecord, PlacementTable};
pub use crate::propagator::{ConstraintPropagator, CpuConstraintPropagator};
pub use crate::random::{RandomSource, ScriptedRandom};
pub use crate::runner::{
    Outcome, ProgressCallback, SolveAttempt, SolvedGrid, Solver, WfcConfig, WfcConfigBuilder,
};
pub use crate::wave::WaveGrid;
pub use wfc_rules::{ActionId, AdjacencyRules, TileSet};

/// Errors that can occur while solving.
///
/// A contradiction inside a single attempt is not an error; it is reported as
/// [`Outcome::Contradiction`] and handled by the retry controller.
#[derive(Error, Debug)]
pub enum WfcError {
    /// The tile catalog or adjacency declarations are invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] TileSetError),
    /// Grid dimensions are zero or do not fit the requested layout.
    #[error("Invalid grid dimensions {width}x{height}x{depth}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        depth: usize,
    },
    /// The adjacency rules were built for a different action count.
    #[error("Adjacency rules cover {rules} actions but the tile set has {tileset}")]
    RuleMismatch { tileset: usize, rules: usize },
    /// Every attempt ended in a contradiction.
    #[error("All {attempts} attempts ended in a contradiction")]
    ExhaustedRetries { attempts: usize },
    /// WFC run was interrupted by the external shutdown signal.
    #[error("WFC run interrupted by signal")]
    Interrupted,
    /// WFC exceeded the configured maximum number of iterations.
    #[error("Maximum iterations ({0}) reached")]
    MaxIterationsReached(u64),
    /// The progress callback asked to abort the run.
    #[error("Progress callback aborted the run: {0}")]
    Callback(String),
}

/// Information about the current state of the WFC algorithm execution.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressInfo {
    /// 1-based index of the attempt in progress.
    pub attempt: usize,
    /// Observe/propagate iterations completed in this attempt.
    pub iterations: u64,
    /// Cells whose domain holds a single action.
    pub collapsed_cells: usize,
    /// The total number of cells in the grid.
    pub total_cells: usize,
    /// Time elapsed since the solve started.
    pub elapsed_time: Duration,
}

/// Defines different boundary handling strategies for one grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BoundaryMode {
    /// Edges wrap around (toroidal topology).
    Periodic,
    /// Grid boundaries act as hard walls; neighbors outside the grid are ignored.
    #[default]
    Clamped,
}
