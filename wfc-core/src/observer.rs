use crate::entropy::EntropyModel;
use crate::random::RandomSource;
use crate::wave::WaveGrid;
use log::trace;
use wfc_rules::ActionId;

/// Scale of the tie-break noise added to each cell's entropy.
const NOISE_SCALE: f64 = 1e-6;

/// Result of one observation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// No cell is left to collapse; every cell now has a resolved action.
    Success,
    /// A cell lost all of its weight.
    Contradiction { cell: (usize, usize, usize) },
    /// One cell was collapsed and marked dirty.
    InProgress {
        cell: (usize, usize, usize),
        action: ActionId,
    },
}

/// Collapses the lowest-entropy unresolved cell.
///
/// Cells are scanned with x outermost, then y, then z. A cell with zero
/// weight sum ends the scan with a contradiction. Each scanned cell consumes
/// one draw for tie-break noise; the collapse consumes one more.
pub fn observe<R: RandomSource + ?Sized>(
    wave: &mut WaveGrid,
    model: &EntropyModel,
    rng: &mut R,
) -> Observation {
    let (width, height, depth) = wave.dimensions();
    let mut min = f64::INFINITY;
    let mut selected = None;

    for x in 0..width {
        for y in 0..height {
            for z in 0..depth {
                let cell = wave.cell_index(x, y, z);
                let domain = wave.domain(cell);
                let stats = model.stats(domain);
                if stats.sum == 0.0 {
                    return Observation::Contradiction { cell: (x, y, z) };
                }

                let noise = NOISE_SCALE * rng.next_f64();
                let entropy = model.entropy(domain, stats);
                if entropy > 0.0 && entropy + noise < min {
                    min = entropy + noise;
                    selected = Some((x, y, z));
                }
            }
        }
    }

    let Some((x, y, z)) = selected else {
        for cell in 0..wave.num_cells() {
            let first = wave.first_enabled(cell);
            wave.set_resolved(cell, first);
        }
        return Observation::Success;
    };

    let cell = wave.cell_index(x, y, z);
    let distribution: Vec<f64> = model
        .weights()
        .iter()
        .enumerate()
        .map(|(action, &weight)| {
            if wave.is_enabled(cell, action) {
                weight
            } else {
                0.0
            }
        })
        .collect();
    let action = ActionId(weighted_random(&distribution, rng.next_f64()));
    trace!("Collapsing ({x}, {y}, {z}) to action {action} (entropy {min:.6})");
    wave.collapse(cell, action);

    Observation::InProgress {
        cell: (x, y, z),
        action,
    }
}

/// Inverse-CDF selection over `weights` with a uniform draw `r` in `[0, 1]`.
///
/// All-zero weights are treated as uniform. Returns the first index with
/// positive weight whose cumulative normalized weight reaches `r`, or the
/// last positive-weight index when rounding leaves none.
///
/// # Panics
///
/// Panics if `weights` is empty.
pub fn weighted_random(weights: &[f64], r: f64) -> usize {
    assert!(!weights.is_empty(), "weighted_random needs at least one weight");
    let sum: f64 = weights.iter().sum();
    let uniform = sum <= 0.0;
    let total = if uniform { weights.len() as f64 } else { sum };

    let mut so_far = 0.0;
    let mut last_positive = weights.len() - 1;
    for (index, &weight) in weights.iter().enumerate() {
        let weight = if uniform { 1.0 } else { weight };
        if weight <= 0.0 {
            continue;
        }
        last_positive = index;
        so_far += weight / total;
        if r <= so_far {
            return index;
        }
    }
    last_positive
}
