use crate::grid::Grid;
use crate::WfcError;
use bitvec::prelude::*;
use log::debug;
use wfc_rules::{ActionId, TileSet};

/// The wave: one domain bitset per cell plus dirty flags and resolved values.
///
/// Domains are stored flat, indexed `cell * num_actions + action`, with cells
/// in `z * width * height + y * width + x` order.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveGrid {
    width: usize,
    height: usize,
    depth: usize,
    num_actions: usize,
    domains: BitVec,
    dirty: BitVec,
    resolved: Grid<Option<ActionId>>,
    collapsed: usize,
}

impl WaveGrid {
    /// Creates a wave with every action enabled in every cell.
    ///
    /// # Errors
    ///
    /// Returns `WfcError::InvalidDimensions` if any dimension or the action
    /// count is zero.
    pub fn new(
        width: usize,
        height: usize,
        depth: usize,
        num_actions: usize,
    ) -> Result<Self, WfcError> {
        if width == 0 || height == 0 || depth == 0 || num_actions == 0 {
            return Err(WfcError::InvalidDimensions {
                width,
                height,
                depth,
            });
        }
        let cells = width * height * depth;
        Ok(Self {
            width,
            height,
            depth,
            num_actions,
            domains: bitvec![1; cells * num_actions],
            dirty: bitvec![0; cells],
            resolved: Grid::new(width, height, depth),
            collapsed: if num_actions == 1 { cells } else { 0 },
        })
    }

    /// Grid size as `(width, height, depth)`.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    /// Total number of cells.
    pub fn num_cells(&self) -> usize {
        self.dirty.len()
    }

    /// Number of actions in every domain.
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Flat index of `(x, y, z)`. Coordinates must be in range.
    #[inline]
    pub fn cell_index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.width * self.height + y * self.width + x
    }

    /// Inverse of [`WaveGrid::cell_index`].
    pub fn coords(&self, cell: usize) -> (usize, usize, usize) {
        let layer = self.width * self.height;
        let rest = cell % layer;
        (rest % self.width, rest / self.width, cell / layer)
    }

    /// Domain of one cell, one bit per action.
    pub fn domain(&self, cell: usize) -> &BitSlice {
        let start = cell * self.num_actions;
        &self.domains[start..start + self.num_actions]
    }

    /// Whether `action` is still possible in `cell`.
    #[inline]
    pub fn is_enabled(&self, cell: usize, action: usize) -> bool {
        self.domains[cell * self.num_actions + action]
    }

    /// Removes `action` from the domain of `cell`.
    #[inline]
    pub fn disable(&mut self, cell: usize, action: usize) {
        let index = cell * self.num_actions + action;
        if !self.domains.replace(index, false) {
            return;
        }
        match self.amount(cell) {
            1 => self.collapsed += 1,
            0 => self.collapsed -= 1,
            _ => {}
        }
    }

    /// Reduces a cell to a single action and marks it dirty.
    pub fn collapse(&mut self, cell: usize, action: ActionId) {
        if self.amount(cell) != 1 {
            self.collapsed += 1;
        }
        let start = cell * self.num_actions;
        let domain = &mut self.domains[start..start + self.num_actions];
        domain.fill(false);
        domain.set(action.0, true);
        self.dirty.set(cell, true);
    }

    /// Whether `cell` changed since the wave was cleared.
    #[inline]
    pub fn is_dirty(&self, cell: usize) -> bool {
        self.dirty[cell]
    }

    /// Flags `cell` as a propagation source.
    #[inline]
    pub fn mark_dirty(&mut self, cell: usize) {
        self.dirty.set(cell, true);
    }

    /// Number of enabled actions in a cell.
    pub fn amount(&self, cell: usize) -> usize {
        self.domain(cell).count_ones()
    }

    /// First enabled action of a cell, if any.
    pub fn first_enabled(&self, cell: usize) -> Option<ActionId> {
        self.domain(cell).first_one().map(ActionId)
    }

    /// Cells whose domain holds exactly one action.
    ///
    /// Kept up to date by every domain change, so reading it is constant time.
    pub fn collapsed_count(&self) -> usize {
        self.collapsed
    }

    /// Whether every cell is down to exactly one action.
    pub fn is_fully_collapsed(&self) -> bool {
        self.collapsed == self.num_cells()
    }

    /// Enabled actions summed over all cells.
    pub fn total_domain_size(&self) -> usize {
        self.domains.count_ones()
    }

    /// Resolved action at `(x, y, z)`, if the cell has been resolved.
    pub fn resolved(&self, x: usize, y: usize, z: usize) -> Option<ActionId> {
        self.resolved.get(x, y, z).copied().flatten()
    }

    pub(crate) fn set_resolved(&mut self, cell: usize, action: Option<ActionId>) {
        self.resolved.data[cell] = action;
    }

    /// The resolved overlay as a dense grid, or `None` while any cell is unresolved.
    pub fn resolved_grid(&self) -> Option<Grid<ActionId>> {
        let data = self.resolved.iter().copied().collect::<Option<Vec<_>>>()?;
        Some(Grid {
            width: self.width,
            height: self.height,
            depth: self.depth,
            data,
        })
    }

    /// Resets every cell and applies the boundary seeding of `tileset`.
    ///
    /// With a ground action, the top layer (`z = depth - 1`) is reduced to
    /// ground and ground is removed everywhere else. With an empty action, the
    /// four outer wall columns are intersected with `{empty}`. Every seeded
    /// cell is marked dirty. The sky action is not seeded.
    pub fn clear(&mut self, tileset: &TileSet) {
        self.domains.fill(true);
        self.dirty.fill(false);
        self.resolved.data.fill(None);
        self.collapsed = if self.num_actions == 1 {
            self.num_cells()
        } else {
            0
        };

        if let Some(ground) = tileset.ground() {
            self.seed_ground(ground);
        }
        if let Some(empty) = tileset.empty() {
            self.seed_empty(empty);
        }
    }

    fn seed_ground(&mut self, ground: ActionId) {
        let top = self.depth - 1;
        for y in 0..self.height {
            for x in 0..self.width {
                for z in 0..self.depth {
                    let cell = self.cell_index(x, y, z);
                    if z == top {
                        self.restrict_to(cell, ground);
                    } else {
                        self.disable(cell, ground.0);
                    }
                    self.mark_dirty(cell);
                }
            }
        }
        debug!("Seeded ground action {ground} on layer z = {top}");
    }

    fn seed_empty(&mut self, empty: ActionId) {
        let (max_x, max_y) = (self.width - 1, self.height - 1);
        for z in 0..self.depth {
            for y in 0..self.height {
                for x in 0..self.width {
                    if x == 0 || x == max_x || y == 0 || y == max_y {
                        let cell = self.cell_index(x, y, z);
                        self.restrict_to(cell, empty);
                        self.mark_dirty(cell);
                    }
                }
            }
        }
        debug!("Seeded empty action {empty} on the outer walls");
    }

    /// Intersects a cell's domain with `{action}`.
    fn restrict_to(&mut self, cell: usize, action: ActionId) {
        let keep = self.is_enabled(cell, action.0);
        match (self.amount(cell) == 1, keep) {
            (false, true) => self.collapsed += 1,
            (true, false) => self.collapsed -= 1,
            _ => {}
        }
        let start = cell * self.num_actions;
        self.domains[start..start + self.num_actions].fill(false);
        if keep {
            self.domains.set(start + action.0, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfc_rules::{Markers, Symmetry, TileDef, TileRole};

    fn tileset(tiles: Vec<TileDef>) -> TileSet {
        TileSet::expand(&tiles, &Markers::default()).unwrap()
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            WaveGrid::new(0, 2, 2, 3),
            Err(WfcError::InvalidDimensions { width: 0, .. })
        ));
        assert!(WaveGrid::new(1, 1, 1, 0).is_err());
    }

    #[test]
    fn coords_round_trip_through_index() {
        let wave = WaveGrid::new(3, 4, 2, 1).unwrap();
        let cell = wave.cell_index(2, 3, 1);
        assert_eq!(cell, 12 + 9 + 2);
        assert_eq!(wave.coords(cell), (2, 3, 1));
    }

    #[test]
    fn clear_without_roles_enables_everything() {
        let tiles = tileset(vec![
            TileDef::new("a", Symmetry::X),
            TileDef::new("b", Symmetry::L),
        ]);
        let mut wave = WaveGrid::new(2, 2, 2, tiles.num_actions()).unwrap();
        wave.collapse(0, ActionId(3));
        wave.clear(&tiles);
        assert_eq!(wave.total_domain_size(), 8 * 5);
        assert!((0..wave.num_cells()).all(|cell| !wave.is_dirty(cell)));
        assert_eq!(wave.resolved(0, 0, 0), None);
    }

    #[test]
    fn clear_seeds_ground_on_the_top_layer() {
        let tiles = tileset(vec![
            TileDef::new("dirt", Symmetry::X).with_role(TileRole::Ground),
            TileDef::new("wall", Symmetry::I),
        ]);
        let mut wave = WaveGrid::new(3, 2, 4, tiles.num_actions()).unwrap();
        wave.clear(&tiles);

        for z in 0..4 {
            for y in 0..2 {
                for x in 0..3 {
                    let cell = wave.cell_index(x, y, z);
                    assert!(wave.is_dirty(cell));
                    if z == 3 {
                        assert_eq!(wave.domain(cell).iter_ones().collect::<Vec<_>>(), vec![0]);
                    } else {
                        assert!(!wave.is_enabled(cell, 0));
                        assert_eq!(wave.amount(cell), 2);
                    }
                }
            }
        }
    }

    #[test]
    fn clear_seeds_empty_on_the_walls() {
        let tiles = tileset(vec![
            TileDef::new("air", Symmetry::X).with_role(TileRole::Empty),
            TileDef::new("block", Symmetry::X),
        ]);
        let mut wave = WaveGrid::new(3, 3, 2, tiles.num_actions()).unwrap();
        wave.clear(&tiles);

        for z in 0..2 {
            let centre = wave.cell_index(1, 1, z);
            assert!(!wave.is_dirty(centre));
            assert_eq!(wave.amount(centre), 2);
            for (x, y) in [(0, 0), (1, 0), (2, 1), (0, 2), (2, 2)] {
                let cell = wave.cell_index(x, y, z);
                assert!(wave.is_dirty(cell));
                assert_eq!(wave.first_enabled(cell), Some(ActionId(0)));
                assert_eq!(wave.amount(cell), 1);
            }
        }
    }

    #[test]
    fn collapse_sets_singleton_and_dirty() {
        let mut wave = WaveGrid::new(2, 1, 1, 4).unwrap();
        wave.collapse(1, ActionId(2));
        assert_eq!(wave.domain(1).iter_ones().collect::<Vec<_>>(), vec![2]);
        assert!(wave.is_dirty(1));
        assert!(!wave.is_dirty(0));
        assert_eq!(wave.collapsed_count(), 1);
        assert!(wave.resolved_grid().is_none());
    }

    fn recount(wave: &WaveGrid) -> usize {
        (0..wave.num_cells())
            .filter(|&cell| wave.amount(cell) == 1)
            .count()
    }

    #[test]
    fn collapsed_count_tracks_every_domain_change() {
        let mut wave = WaveGrid::new(3, 1, 1, 3).unwrap();
        assert_eq!(wave.collapsed_count(), 0);

        wave.disable(0, 0);
        wave.disable(0, 0);
        assert_eq!(wave.collapsed_count(), recount(&wave));
        wave.disable(0, 1);
        assert_eq!(wave.collapsed_count(), 1);
        // Emptying a singleton drops it from the count.
        wave.disable(0, 2);
        assert_eq!(wave.collapsed_count(), 0);

        wave.collapse(1, ActionId(1));
        wave.collapse(1, ActionId(2));
        assert_eq!(wave.collapsed_count(), 1);
        wave.collapse(2, ActionId(0));
        assert_eq!(wave.collapsed_count(), recount(&wave));
        assert!(!wave.is_fully_collapsed());

        let tiles = tileset(vec![
            TileDef::new("air", Symmetry::X).with_role(TileRole::Empty),
            TileDef::new("block", Symmetry::X),
            TileDef::new("slab", Symmetry::X),
        ]);
        let mut walled = WaveGrid::new(3, 3, 2, tiles.num_actions()).unwrap();
        walled.clear(&tiles);
        assert_eq!(walled.collapsed_count(), 16);
        assert_eq!(walled.collapsed_count(), recount(&walled));
        walled.collapse(walled.cell_index(1, 1, 0), ActionId(1));
        walled.collapse(walled.cell_index(1, 1, 1), ActionId(2));
        assert!(walled.is_fully_collapsed());
    }

    #[test]
    fn single_action_wave_starts_collapsed() {
        let mut wave = WaveGrid::new(2, 2, 1, 1).unwrap();
        assert!(wave.is_fully_collapsed());
        wave.disable(3, 0);
        assert_eq!(wave.collapsed_count(), 3);
        wave.clear(&tileset(vec![TileDef::new("only", Symmetry::X)]));
        assert!(wave.is_fully_collapsed());
    }
}
