use crate::formats::FormatParser;
use crate::{LoadError, NeighborDecl, RuleSet, TileDef};
use log::debug;
use serde::Deserialize;

/// A parser for JSON rule files wrapped in a top-level `set` object.
///
/// ```json
/// {
///   "set": {
///     "voxelsize": 2,
///     "tiles": [{ "name": "corner", "symmetry": "L", "weight": 2 }],
///     "neighbors": [["horizontal", "corner 1", "corner"]]
///   }
/// }
/// ```
///
/// Each neighbor entry is `[kind, left, right]` or `[left, right]`; the short
/// form is horizontal, as is a `null` or empty kind. A `null` symmetry reads
/// as `X`. Unknown keys are ignored.
pub struct JsonFormatParser;

impl Default for JsonFormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatParser {
    pub fn new() -> Self {
        Self
    }

    fn neighbor_from_entry(
        &self,
        index: usize,
        entry: Vec<Option<String>>,
    ) -> Result<NeighborDecl, LoadError> {
        let mut parts = entry.into_iter().map(Option::unwrap_or_default);
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(left), Some(right), None, None) => Ok(NeighborDecl::horizontal(left, right)),
            (Some(kind), Some(left), Some(right), None) => Ok(NeighborDecl { kind, left, right }),
            _ => Err(LoadError::ParseError {
                format: self.format_name(),
                message: format!("neighbor entry {index} must have 2 or 3 elements"),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRuleFile {
    set: JsonRuleSet,
}

#[derive(Debug, Deserialize)]
struct JsonRuleSet {
    #[serde(default)]
    voxelsize: Option<f32>,
    tiles: Vec<TileDef>,
    #[serde(default)]
    neighbors: Vec<Vec<Option<String>>>,
}

impl FormatParser for JsonFormatParser {
    fn format_name(&self) -> &'static str {
        "JSON"
    }

    fn parse(&self, json_content: &str) -> Result<RuleSet, LoadError> {
        let file: JsonRuleFile =
            serde_json::from_str(json_content).map_err(|e| LoadError::ParseError {
                format: self.format_name(),
                message: e.to_string(),
            })?;

        let neighbors = file
            .set
            .neighbors
            .into_iter()
            .enumerate()
            .map(|(index, entry)| self.neighbor_from_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rule_set = RuleSet::new(file.set.tiles, neighbors);
        if let Some(voxel_size) = file.set.voxelsize {
            rule_set.voxel_size = voxel_size;
        }
        debug!(
            "Parsed JSON rules: {} tiles, {} neighbor declarations",
            rule_set.tiles.len(),
            rule_set.neighbors.len()
        );
        Ok(rule_set)
    }
}
