use crate::wave::WaveGrid;
use std::fmt::Debug;
use wfc_rules::AdjacencyRules;

pub mod cpu;

pub use cpu::CpuConstraintPropagator;

/// Trait defining the interface for a constraint propagation algorithm.
///
/// Implementors remove domain entries that lost their support next to dirty
/// cells, according to the `AdjacencyRules`.
pub trait ConstraintPropagator: Debug {
    /// Runs one pass over the whole grid.
    ///
    /// Returns `true` if any domain entry was removed.
    fn propagate(&self, wave: &mut WaveGrid, rules: &AdjacencyRules) -> bool;

    /// Repeats [`propagate`](Self::propagate) until a pass changes nothing.
    ///
    /// Returns the number of passes run, including the final unchanged one.
    fn propagate_to_fixpoint(&self, wave: &mut WaveGrid, rules: &AdjacencyRules) -> usize {
        let mut passes = 1;
        while self.propagate(wave, rules) {
            passes += 1;
        }
        passes
    }
}
