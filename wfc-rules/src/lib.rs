//! Tile catalogs and adjacency rules for the voxel Wave Function Collapse solver.
//!
//! A rule file declares base tiles (with a symmetry class) and adjacency
//! declarations between them. This crate expands the catalog into oriented
//! actions ([`TileSet`]) and builds the per-direction compatibility matrices
//! ([`AdjacencyRules`]) the solver consumes.

use thiserror::Error;

pub mod formats;
pub mod generator;
pub mod loader;
pub mod rules;
pub mod tileset;
pub mod types;

pub use generator::generate_adjacency_rules;
pub use rules::AdjacencyRules;
pub use tileset::{Action, TileSet};
pub use types::{
    ActionId, AdjacencyKind, Direction, Markers, NeighborDecl, RuleSet, Symmetry, TileDef, TileId,
    TileRef, TileRole, TileSetError, Transformation,
};

/// Errors raised while reading or interpreting a rule file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules format ({format}): {message}")]
    ParseError {
        format: &'static str,
        message: String,
    },
    #[error("Unsupported rule file format: {0}")]
    UnsupportedFormat(String),
    #[error("Invalid rule data: {0}")]
    InvalidData(#[from] TileSetError),
}

/// Expands a parsed rule set into its action table and propagator.
///
/// Marker names in `markers` take precedence over `role` flags declared on
/// the tiles themselves.
pub fn compile(
    rule_set: &RuleSet,
    markers: &Markers,
) -> Result<(TileSet, AdjacencyRules), TileSetError> {
    let tileset = TileSet::expand(&rule_set.tiles, markers)?;
    let rules = generate_adjacency_rules(&tileset, &rule_set.neighbors)?;
    Ok((tileset, rules))
}
