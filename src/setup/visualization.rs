//! Export of intermediate wave states captured during a solve.

use crate::error::AppError;
use crate::output::write_json;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use wfc_core::{map_wave, PlacementTable, WaveGrid};

/// File name of the `index`-th frame.
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:04}.json")
}

/// Writes every captured frame as a JSON array of placement records.
///
/// Cells that are still undecided show all their candidates, shrunk. The
/// directory is created when missing. Returns the written paths in order.
pub fn export_frames(
    dir: &Path,
    frames: &[WaveGrid],
    table: &PlacementTable,
) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)?;
    log::info!("Exporting {} frames to {}", frames.len(), dir.display());

    let mut written = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let path = dir.join(frame_file_name(index));
        let records = map_wave(table, frame);
        log::trace!(
            "Frame {}: {} candidate records, {} cells collapsed",
            index,
            records.len(),
            frame.collapsed_count()
        );
        write_json(BufWriter::new(File::create(&path)?), &records)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wfc_core::PlacementRecord;
    use wfc_rules::{ActionId, Markers, Symmetry, TileDef, TileSet};

    #[test]
    fn frames_are_written_in_order() {
        let tileset = TileSet::expand(
            &[
                TileDef::new("a", Symmetry::X),
                TileDef::new("b", Symmetry::X),
            ],
            &Markers::default(),
        )
        .unwrap();
        let table = PlacementTable::new(&tileset, 1.0);

        let open = WaveGrid::new(1, 1, 1, 2).unwrap();
        let mut collapsed = open.clone();
        collapsed.collapse(0, ActionId(1));

        let dir = tempdir().unwrap();
        let target = dir.path().join("frames");
        let paths = export_frames(&target, &[open, collapsed], &table).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("frame_0000.json"));

        let first: Vec<PlacementRecord> =
            serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|r| (r.scale - 0.2).abs() < 1e-6));

        let second: Vec<PlacementRecord> =
            serde_json::from_str(&fs::read_to_string(&paths[1]).unwrap()).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].mesh, "b");
        assert_eq!(second[0].scale, 1.0);
    }
}
