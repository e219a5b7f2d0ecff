use crate::formats::{FormatParser, JsonFormatParser, RonFormatParser};
use crate::{LoadError, RuleSet};
use log::info;
use std::fs;
use std::path::Path;

/// Picks a parser for `path` from its extension.
///
/// # Errors
///
/// Returns [`LoadError::UnsupportedFormat`] for missing or unknown extensions.
pub fn parser_for_path(path: &Path) -> Result<Box<dyn FormatParser>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("ron") => Ok(Box::new(RonFormatParser::new())),
        Some("json") => Ok(Box::new(JsonFormatParser::new())),
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Loads a rule set from a `.ron` or `.json` file.
///
/// The returned [`RuleSet`] still holds textual tile references; pass it to
/// [`crate::compile`] to expand actions and build the adjacency matrices.
///
/// # Errors
///
/// Returns a [`LoadError`] if the format is unsupported, the file cannot be
/// read, or its content does not parse.
pub fn load_from_file(path: &Path) -> Result<RuleSet, LoadError> {
    let parser = parser_for_path(path)?;
    let content = fs::read_to_string(path)?;
    let rule_set = parser.parse(&content)?;
    info!(
        "Loaded {} tiles and {} neighbor declarations from {} ({})",
        rule_set.tiles.len(),
        rule_set.neighbors.len(),
        path.display(),
        parser.format_name()
    );
    Ok(rule_set)
}
