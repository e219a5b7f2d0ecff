use crate::{LoadError, RuleSet};

/// Trait defining the interface for format-specific rule parsers.
///
/// Implementors turn the textual content of a rule file into a [`RuleSet`].
/// Tile references inside the rule set are validated later, when the
/// catalog is expanded and the adjacency matrices are built.
pub trait FormatParser {
    /// Parses rule content into a [`RuleSet`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ParseError`] when the content is not valid for the
    /// format.
    fn parse(&self, content: &str) -> Result<RuleSet, LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// Used in logging and in parse error messages.
    fn format_name(&self) -> &'static str;
}
