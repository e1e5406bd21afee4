mod error;
mod grammar;
pub(crate) mod lexer;

use serde::{Deserialize, Serialize};

pub use error::ParseError;

use crate::{Comparison, Node};

/// Default bound on parenthesis nesting.
pub const DEFAULT_MAX_DEPTH: usize = 24;

/// Default bound on rule source length, in bytes.
pub const DEFAULT_MAX_LEN: usize = 4096;

/// How comparison leaves are represented in a parsed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafMode {
    /// Leaves are structured [`Comparison`]s.
    #[default]
    Structured,
    /// Leaves are [`Node::Operand`] fragments holding the comparison's source text.
    Fragment,
}

/// Limits and leaf representation used by [`parse_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub max_depth: usize,
    pub max_len: usize,
    pub leaf_mode: LeafMode,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_len: DEFAULT_MAX_LEN,
            leaf_mode: LeafMode::Structured,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    #[must_use]
    pub fn with_leaf_mode(mut self, leaf_mode: LeafMode) -> Self {
        self.leaf_mode = leaf_mode;
        self
    }
}

/// Parse rule source into a [`Node`] tree with default options.
///
/// # Errors
///
/// Returns [`ParseError`] if the source is empty, malformed, uses an
/// unsupported operator, or nests deeper than [`DEFAULT_MAX_DEPTH`].
pub fn parse(source: &str) -> Result<Node, ParseError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse rule source with explicit limits and leaf mode.
///
/// # Errors
///
/// Returns [`ParseError`] as for [`parse`], and [`ParseError::TooLong`] if the
/// source exceeds `options.max_len` bytes.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Node, ParseError> {
    if source.len() > options.max_len {
        return Err(ParseError::TooLong {
            len: source.len(),
            limit: options.max_len,
        });
    }
    grammar::RuleParser::new(source, options.clone())?.parse_rule()
}

/// Parse text that must hold exactly one `attribute relation literal` comparison.
pub(crate) fn parse_comparison(text: &str) -> Result<Comparison, ParseError> {
    match &parse(text)? {
        Node::Comparison(comparison) => Ok(comparison.clone()),
        other => Err(ParseError::syntax(
            0,
            format!("expected a single comparison, found '{other}'"),
        )),
    }
}
