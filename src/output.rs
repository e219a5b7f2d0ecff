use crate::config::OutputFormat;
use crate::error::AppError;
use colored::{Color, Colorize};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use wfc_core::{map_resolved, text_output, PlacementRecord, PlacementTable, SolvedGrid, TileSet};

const PALETTE: [Color; 8] = [
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::Red,
    Color::BrightGreen,
    Color::BrightBlue,
];

/// Flat CSV row of one placement record.
#[derive(Debug, Serialize)]
struct PlacementRow<'a> {
    mesh: &'a str,
    x: f32,
    y: f32,
    z: f32,
    qx: f32,
    qy: f32,
    qz: f32,
    qw: f32,
    scale: f32,
}

impl<'a> From<&'a PlacementRecord> for PlacementRow<'a> {
    fn from(record: &'a PlacementRecord) -> Self {
        let [x, y, z] = record.position;
        let [qx, qy, qz, qw] = record.rotation;
        Self {
            mesh: &record.mesh,
            x,
            y,
            z,
            qx,
            qy,
            qz,
            qw,
            scale: record.scale,
        }
    }
}

/// Writes the records as a pretty-printed JSON array.
pub fn write_json<W: Write>(mut writer: W, records: &[PlacementRecord]) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes one CSV row per record, with a header line.
pub fn write_csv<W: Write>(writer: W, records: &[PlacementRecord]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(PlacementRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a solved grid in `format`.
///
/// Returns the number of placement records written; the text format writes
/// one label per cell and reports zero records.
pub fn write_solution<W: Write>(
    mut writer: W,
    format: OutputFormat,
    solved: &SolvedGrid,
    tileset: &TileSet,
    table: &PlacementTable,
) -> Result<usize, AppError> {
    match format {
        OutputFormat::Json => {
            let records = map_resolved(table, solved);
            write_json(writer, &records)?;
            Ok(records.len())
        }
        OutputFormat::Csv => {
            let records = map_resolved(table, solved);
            write_csv(writer, &records)?;
            Ok(records.len())
        }
        OutputFormat::Text => {
            writer.write_all(text_output(solved, tileset).as_bytes())?;
            writer.flush()?;
            Ok(0)
        }
    }
}

/// Saves the solution to `path`, or to stdout when no path is given.
pub fn save_solution(
    path: Option<&Path>,
    format: OutputFormat,
    solved: &SolvedGrid,
    tileset: &TileSet,
    table: &PlacementTable,
) -> Result<(), AppError> {
    let written = match path {
        Some(path) => {
            log::info!("Saving {:?} output to {}", format, path.display());
            let file = File::create(path).map_err(|e| {
                AppError::Output(format!(
                    "Failed to create output file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            write_solution(BufWriter::new(file), format, solved, tileset, table)?
        }
        None => {
            let stdout = io::stdout();
            write_solution(stdout.lock(), format, solved, tileset, table)?
        }
    };
    log::info!("Output written ({} placement records)", written);
    Ok(())
}

/// Colored layer-by-layer view of a solved grid, one color per base tile.
///
/// Hidden tiles are dimmed.
pub fn render_layers(solved: &SolvedGrid, tileset: &TileSet) -> String {
    let (width, height, depth) = solved.dimensions();
    let label = |x, y, z| {
        solved
            .get(x, y, z)
            .and_then(|action| Some((action, tileset.label(action)?)))
    };
    let cell_width = (0..tileset.num_actions())
        .filter_map(|id| tileset.label(wfc_rules::ActionId(id)))
        .map(|label| label.len())
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    for z in 0..depth {
        out.push_str(&format!("Layer {z}").bold().to_string());
        out.push('\n');
        for y in 0..height {
            for x in 0..width {
                let cell = match label(x, y, z) {
                    Some((action, text)) => {
                        let padded = format!("{text:<cell_width$}");
                        let tile = tileset.tile_of(action);
                        let color = tileset
                            .action(action)
                            .map_or(Color::White, |a| PALETTE[a.tile.0 % PALETTE.len()]);
                        if tile.is_some_and(|t| t.hidden) {
                            padded.dimmed().to_string()
                        } else {
                            padded.color(color).to_string()
                        }
                    }
                    None => format!("{:<cell_width$}", "?").red().to_string(),
                };
                out.push_str(&cell);
                out.push(' ');
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
