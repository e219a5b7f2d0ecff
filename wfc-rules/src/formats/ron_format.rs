use crate::formats::FormatParser;
use crate::{LoadError, RuleSet};
use log::debug;

/// A parser implementation for RON (Rusty Object Notation) format rules.
///
/// The file is a direct serialization of [`RuleSet`]:
///
/// ```ron
/// (
///     voxel_size: 1.0,
///     tiles: [
///         (name: "floor", symmetry: "X", weight: Some(2.0)),
///         (name: "corner", symmetry: "L"),
///     ],
///     neighbors: [
///         (kind: "horizontal", left: "corner 1", right: "floor"),
///     ],
/// )
/// ```
pub struct RonFormatParser;

impl Default for RonFormatParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RonFormatParser {
    /// Creates a new RON format parser
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    fn parse(&self, ron_content: &str) -> Result<RuleSet, LoadError> {
        let rule_set: RuleSet =
            ron::from_str(ron_content).map_err(|e| LoadError::ParseError {
                format: self.format_name(),
                message: e.to_string(),
            })?;
        debug!(
            "Parsed RON rules: {} tiles, {} neighbor declarations",
            rule_set.tiles.len(),
            rule_set.neighbors.len()
        );
        Ok(rule_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdjacencyKind, Symmetry, TileRole};

    #[test]
    fn parses_full_rule_set() {
        let content = r#"(
            voxel_size: 2.0,
            tiles: [
                (name: "ground", symmetry: "X", role: Some("ground")),
                (name: "corner", symmetry: "L", weight: Some(3.0), mesh: Some("corner_mesh")),
                (name: "air", hidden: true),
            ],
            neighbors: [
                (kind: "horizontal", left: "corner 1", right: "ground"),
                (left: "air", right: "air"),
                (kind: "vertical", left: "ground", right: "air"),
            ],
        )"#;
        let rule_set = RonFormatParser::new().parse(content).unwrap();

        assert_eq!(rule_set.voxel_size, 2.0);
        assert_eq!(rule_set.tiles.len(), 3);
        assert_eq!(rule_set.tiles[0].role, Some(TileRole::Ground));
        assert_eq!(rule_set.tiles[1].symmetry, Symmetry::L);
        assert_eq!(rule_set.tiles[1].weight, Some(3.0));
        assert_eq!(rule_set.tiles[1].mesh_name(), "corner_mesh");
        assert_eq!(rule_set.tiles[2].symmetry, Symmetry::X);
        assert!(rule_set.tiles[2].hidden);
        assert_eq!(rule_set.neighbors[1].kind(), AdjacencyKind::Horizontal);
        assert_eq!(rule_set.neighbors[2].kind(), AdjacencyKind::Vertical);
    }

    #[test]
    fn voxel_size_and_neighbors_default() {
        let rule_set = RonFormatParser::new()
            .parse(r#"(tiles: [(name: "a")])"#)
            .unwrap();
        assert_eq!(rule_set.voxel_size, 1.0);
        assert!(rule_set.neighbors.is_empty());
    }

    #[test]
    fn malformed_content_is_a_parse_error() {
        let err = RonFormatParser::new().parse("(tiles: [").unwrap_err();
        match err {
            LoadError::ParseError { format, .. } => {
                assert_eq!(format, "Rusty Object Notation (RON)")
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }
}
