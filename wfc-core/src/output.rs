use crate::runner::SolvedGrid;
use crate::wave::WaveGrid;
use nalgebra::{UnitQuaternion, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use wfc_rules::{ActionId, TileSet};

/// Scale of each candidate when a cell still holds several actions.
const CANDIDATE_SCALE: f32 = 0.2;

/// One mesh instance in world space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementRecord {
    /// Mesh identifier of the tile.
    pub mesh: String,
    /// Cell coordinates scaled by the voxel size.
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub rotation: [f32; 4],
    /// 1 for a resolved cell, smaller for one of several candidates.
    pub scale: f32,
}

#[derive(Debug, Clone)]
struct Placement {
    mesh: String,
    rotation: UnitQuaternion<f32>,
}

/// Per-action mesh and rotation, built once per tile set.
///
/// Hidden tiles have no entry and never produce records.
#[derive(Debug, Clone)]
pub struct PlacementTable {
    placements: Vec<Option<Placement>>,
    voxel_size: f32,
}

impl PlacementTable {
    /// Builds the mesh and rotation of every visible action.
    pub fn new(tileset: &TileSet, voxel_size: f32) -> Self {
        let placements = tileset
            .actions()
            .iter()
            .map(|action| {
                let tile = tileset.tile(action.tile)?;
                if tile.hidden {
                    return None;
                }
                let rotation = if action.rotation == 0 {
                    UnitQuaternion::identity()
                } else {
                    UnitQuaternion::from_axis_angle(
                        &Vector3::z_axis(),
                        action.rotation as f32 * FRAC_PI_2,
                    )
                };
                Some(Placement {
                    mesh: tile.mesh_name().to_owned(),
                    rotation,
                })
            })
            .collect();
        Self {
            placements,
            voxel_size,
        }
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Rotation applied to an action, if it is placed at all.
    pub fn rotation(&self, action: ActionId) -> Option<UnitQuaternion<f32>> {
        self.placement(action).map(|placement| placement.rotation)
    }

    fn placement(&self, action: ActionId) -> Option<&Placement> {
        self.placements.get(action.0).and_then(Option::as_ref)
    }

    fn record(
        &self,
        action: ActionId,
        (x, y, z): (usize, usize, usize),
    ) -> Option<PlacementRecord> {
        let placement = self.placement(action)?;
        let q = placement.rotation.quaternion();
        Some(PlacementRecord {
            mesh: placement.mesh.clone(),
            position: [
                x as f32 * self.voxel_size,
                y as f32 * self.voxel_size,
                z as f32 * self.voxel_size,
            ],
            rotation: [q.i, q.j, q.k, q.w],
            scale: 1.0,
        })
    }
}

/// Visits output coordinates with z outermost, paired with the grid cell they show.
///
/// Output `y` and `z` run opposite to grid `y` and `z`.
fn output_cells(
    (width, height, depth): (usize, usize, usize),
) -> impl Iterator<Item = ((usize, usize, usize), (usize, usize, usize))> {
    (0..depth).flat_map(move |z| {
        (0..height).flat_map(move |y| {
            (0..width).map(move |x| ((x, y, z), (x, height - 1 - y, depth - 1 - z)))
        })
    })
}

/// Placement records for a solved grid.
pub fn map_resolved(table: &PlacementTable, solved: &SolvedGrid) -> Vec<PlacementRecord> {
    output_cells(solved.dimensions())
        .filter_map(|(position, (gx, gy, gz))| {
            let action = solved.get(gx, gy, gz)?;
            table.record(action, position)
        })
        .collect()
}

/// Placement records for every enabled action of a partially solved wave.
///
/// Cells with several candidates show each of them shrunk and shifted along
/// x by the action id.
pub fn map_wave(table: &PlacementTable, wave: &WaveGrid) -> Vec<PlacementRecord> {
    let mut records = Vec::new();
    for (position, (gx, gy, gz)) in output_cells(wave.dimensions()) {
        let cell = wave.cell_index(gx, gy, gz);
        let domain = wave.domain(cell);
        let several = domain.count_ones() > 1;
        for action in domain.iter_ones() {
            let Some(mut record) = table.record(ActionId(action), position) else {
                continue;
            };
            if several {
                record.scale *= CANDIDATE_SCALE;
                record.position[0] += action as f32;
            }
            records.push(record);
        }
    }
    records
}

/// Layer-by-layer dump of `"tile rotation, "` labels.
///
/// One line per row, with a blank line after each layer.
pub fn text_output(solved: &SolvedGrid, tileset: &TileSet) -> String {
    let (width, height, depth) = solved.dimensions();
    let mut out = String::new();
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                let label = solved
                    .get(x, y, z)
                    .and_then(|action| tileset.label(action))
                    .unwrap_or_else(|| "?".to_owned());
                out.push_str(&label);
                out.push_str(", ");
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use wfc_rules::{Markers, Symmetry, TileDef};

    fn tileset() -> TileSet {
        TileSet::expand(
            &[
                TileDef::new("floor", Symmetry::X),
                TileDef::new("ramp", Symmetry::L).with_mesh("ramp_mesh"),
                TileDef::new("air", Symmetry::X).hidden(),
            ],
            &Markers::default(),
        )
        .unwrap()
    }

    fn solved(width: usize, height: usize, depth: usize, actions: Vec<usize>) -> SolvedGrid {
        let grid = Grid {
            width,
            height,
            depth,
            data: actions.into_iter().map(ActionId).collect(),
        };
        SolvedGrid::from_parts(grid, 1, Vec::new())
    }

    #[test]
    fn rotations_follow_orientation() {
        let table = PlacementTable::new(&tileset(), 1.0);
        assert_eq!(table.rotation(ActionId(1)), Some(UnitQuaternion::identity()));
        let quarter = table.rotation(ActionId(2)).unwrap();
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert!(quarter.angle_to(&expected) < 1e-6);
        assert!(table.rotation(ActionId(5)).is_none());
    }

    #[test]
    fn resolved_mapping_flips_y_and_z() {
        let tileset = tileset();
        let table = PlacementTable::new(&tileset, 2.0);
        // 2x2x1 grid: (0,0) floor, (1,0) ramp 1, (0,1) air, (1,1) ramp 3
        let grid = solved(2, 2, 1, vec![0, 2, 5, 4]);
        let records = map_resolved(&table, &grid);

        // Output row y = 0 shows grid row y = 1: air is skipped.
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].mesh, "ramp_mesh");
        assert_eq!(records[0].position, [2.0, 0.0, 0.0]);
        assert_eq!(records[1].mesh, "floor");
        assert_eq!(records[1].position, [0.0, 2.0, 0.0]);
        assert_eq!(records[2].position, [2.0, 2.0, 0.0]);
        assert!(records.iter().all(|record| record.scale == 1.0));
        assert_eq!(records[1].rotation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn wave_mapping_shrinks_candidates() {
        let tileset = tileset();
        let table = PlacementTable::new(&tileset, 1.0);
        let mut wave = WaveGrid::new(1, 1, 1, tileset.num_actions()).unwrap();
        for action in [2, 3, 4] {
            wave.disable(0, action);
        }
        // Remaining: floor (0), ramp 0 (1), air (5, hidden).
        let records = map_wave(&table, &wave);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(records[1].position, [1.0, 0.0, 0.0]);
        assert!(records.iter().all(|record| record.scale == CANDIDATE_SCALE));

        wave.collapse(0, ActionId(3));
        let records = map_wave(&table, &wave);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(records[0].scale, 1.0);
    }

    #[test]
    fn text_output_lists_layers() {
        let tileset = tileset();
        let grid = solved(2, 1, 2, vec![0, 2, 4, 5]);
        assert_eq!(
            text_output(&grid, &tileset),
            "floor 0, ramp 1, \n\nramp 3, air 0, \n\n"
        );
    }

    #[test]
    fn text_output_marks_unknown_actions() {
        let tileset = tileset();
        let grid = solved(2, 1, 1, vec![0, 99]);
        assert_eq!(text_output(&grid, &tileset), "floor 0, ?, \n\n");
    }
}
