use crate::{grid::Boundaries, propagator::ConstraintPropagator, wave::WaveGrid};
use wfc_rules::{ActionId, AdjacencyRules, Direction};

/// Single-threaded propagator sweeping the grid in x, y, z order.
///
/// Domains are updated in place, so removals made earlier in a pass are
/// visible to later cells of the same pass.
#[derive(Debug, Clone, Default)]
pub struct CpuConstraintPropagator {
    boundaries: Boundaries,
}

impl CpuConstraintPropagator {
    pub fn new(boundaries: Boundaries) -> Self {
        Self { boundaries }
    }

    pub fn boundaries(&self) -> Boundaries {
        self.boundaries
    }

    /// Whether some enabled action of `source` supports `target_action` along `direction`.
    fn is_supported(
        wave: &WaveGrid,
        rules: &AdjacencyRules,
        direction: Direction,
        target_action: usize,
        source: usize,
    ) -> bool {
        rules
            .row(direction, ActionId(target_action))
            .iter_ones()
            .any(|source_action| wave.is_enabled(source, source_action))
    }
}

impl ConstraintPropagator for CpuConstraintPropagator {
    fn propagate(&self, wave: &mut WaveGrid, rules: &AdjacencyRules) -> bool {
        let dimensions = wave.dimensions();
        let (width, height, depth) = dimensions;
        let num_actions = wave.num_actions();
        let mut changed = false;

        for x in 0..width {
            for y in 0..height {
                for z in 0..depth {
                    let target = wave.cell_index(x, y, z);
                    for direction in Direction::ALL {
                        let Some((sx, sy, sz)) =
                            self.boundaries.source_cell((x, y, z), direction, dimensions)
                        else {
                            continue;
                        };
                        let source = wave.cell_index(sx, sy, sz);
                        if !wave.is_dirty(source) {
                            continue;
                        }

                        for action in 0..num_actions {
                            if !wave.is_enabled(target, action) {
                                continue;
                            }
                            if !Self::is_supported(wave, rules, direction, action, source) {
                                wave.disable(target, action);
                                wave.mark_dirty(target);
                                changed = true;
                            }
                        }
                    }
                }
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundaryMode;

    fn clamped() -> CpuConstraintPropagator {
        CpuConstraintPropagator::new(Boundaries::uniform(BoundaryMode::Clamped))
    }

    #[test]
    fn clean_grid_is_left_alone() {
        let rules = AdjacencyRules::empty(2);
        let mut wave = WaveGrid::new(2, 1, 1, 2).unwrap();
        assert!(!clamped().propagate(&mut wave, &rules));
        assert_eq!(wave.total_domain_size(), 4);
    }

    #[test]
    fn collapse_removes_unsupported_neighbours() {
        // Along +x, a cell holding 1 needs 0 at x - 1; along -x, 0 needs 1 at x + 1.
        let mut rules = AdjacencyRules::from_allowed_tuples(2, [(Direction::PosX, 1, 0)]);
        rules.transpose_into(Direction::PosX, Direction::NegX);
        let mut wave = WaveGrid::new(2, 1, 1, 2).unwrap();
        wave.collapse(0, ActionId(0));

        let propagator = clamped();
        assert!(propagator.propagate(&mut wave, &rules));
        assert_eq!(wave.domain(1).iter_ones().collect::<Vec<_>>(), vec![1]);
        assert!(wave.is_dirty(1));
        assert_eq!(propagator.propagate_to_fixpoint(&mut wave, &rules), 1);
    }

    #[test]
    fn unsupported_pairs_empty_the_neighbour() {
        let rules = AdjacencyRules::empty(2);
        let mut wave = WaveGrid::new(2, 1, 1, 2).unwrap();
        wave.collapse(0, ActionId(1));
        clamped().propagate_to_fixpoint(&mut wave, &rules);
        assert_eq!(wave.amount(1), 0);
        // The emptied neighbour in turn strips the collapsed cell.
        assert_eq!(wave.amount(0), 0);
    }

    #[test]
    fn periodic_axes_wrap_around() {
        let mut rules = AdjacencyRules::from_allowed_tuples(
            2,
            [(Direction::PosX, 0, 1), (Direction::PosX, 1, 0)],
        );
        rules.transpose_into(Direction::PosX, Direction::NegX);
        let mut wave = WaveGrid::new(4, 1, 1, 2).unwrap();
        wave.collapse(0, ActionId(0));

        let propagator = CpuConstraintPropagator::new(Boundaries {
            x: BoundaryMode::Periodic,
            y: BoundaryMode::Clamped,
            z: BoundaryMode::Clamped,
        });
        propagator.propagate_to_fixpoint(&mut wave, &rules);
        let resolved: Vec<usize> = (0..4)
            .map(|cell| wave.first_enabled(cell).unwrap().0)
            .collect();
        assert_eq!(resolved, vec![0, 1, 0, 1]);
        assert_eq!(wave.total_domain_size(), 4);
    }

    #[test]
    fn clamped_edges_are_not_constrained() {
        // Along +x every action needs 0 at x - 1.
        let mut rules = AdjacencyRules::from_allowed_tuples(
            2,
            [(Direction::PosX, 0, 0), (Direction::PosX, 1, 0)],
        );
        rules.transpose_into(Direction::PosX, Direction::NegX);
        let mut wave = WaveGrid::new(3, 1, 1, 2).unwrap();
        let last = wave.cell_index(2, 0, 0);
        wave.collapse(last, ActionId(1));

        clamped().propagate_to_fixpoint(&mut wave, &rules);
        let resolved: Vec<Option<usize>> = (0..3)
            .map(|cell| wave.first_enabled(cell).map(|action| action.0))
            .collect();
        assert_eq!(resolved, vec![Some(0), Some(0), Some(1)]);
        assert_eq!(wave.total_domain_size(), 3);

        // Wrapping x makes the first cell read the last one and fail.
        let periodic = CpuConstraintPropagator::new(Boundaries {
            x: BoundaryMode::Periodic,
            ..Boundaries::default()
        });
        let mut wave = WaveGrid::new(3, 1, 1, 2).unwrap();
        wave.collapse(last, ActionId(1));
        periodic.propagate_to_fixpoint(&mut wave, &rules);
        assert_eq!(wave.amount(0), 0);
    }
}
