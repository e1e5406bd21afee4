use serde::{Deserialize, Serialize};

use crate::combine::combine_with;
use crate::parse::{parse_with, LeafMode, ParseOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LEN};
use crate::validate::{validate_node, validate_with, ValidationMode};
use crate::{evaluate, BoolOp, CombineError, EvalError, Node, Record, RuleError, ValidationError};

/// Settings shared by every rule an [`Engine`] builds.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// # use ruletree::{EngineConfig, ValidationMode};
/// let config = EngineConfig::from_json(r#"{"validation": "substring", "max_depth": 8}"#).unwrap();
/// assert_eq!(config.validation, ValidationMode::Substring);
/// assert_eq!(config.max_depth, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub validation: ValidationMode,
    pub leaf_mode: LeafMode,
    pub max_depth: usize,
    pub max_source_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation: ValidationMode::Structural,
            leaf_mode: LeafMode::Structured,
            max_depth: DEFAULT_MAX_DEPTH,
            max_source_len: DEFAULT_MAX_LEN,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or unknown enum names.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    #[must_use]
    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_leaf_mode(mut self, leaf_mode: LeafMode) -> Self {
        self.leaf_mode = leaf_mode;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_max_source_len(mut self, max_source_len: usize) -> Self {
        self.max_source_len = max_source_len;
        self
    }

    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth,
            max_len: self.max_source_len,
            leaf_mode: self.leaf_mode,
        }
    }
}

/// Validates, parses, combines and evaluates rules under one [`EngineConfig`].
///
/// The engine holds no state besides its configuration and can be shared
/// freely between threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check rule source with the configured validation mode.
    ///
    /// # Errors
    ///
    /// See [`validate_with`].
    pub fn validate(&self, source: &str) -> Result<(), ValidationError> {
        validate_with(source, self.config.validation, &self.config.parse_options())
    }

    /// Validate and parse rule source into a tree.
    ///
    /// # Errors
    ///
    /// [`RuleError::Parse`] if the source does not parse under the configured
    /// limits, [`RuleError::Validation`] if it fails the configured check.
    pub fn build(&self, source: &str) -> Result<Node, RuleError> {
        let options = self.config.parse_options();
        match self.config.validation {
            ValidationMode::Structural => {
                let node = parse_with(source, &options)?;
                validate_node(&node)?;
                Ok(node)
            }
            ValidationMode::Substring => {
                validate_with(source, ValidationMode::Substring, &options)?;
                Ok(parse_with(source, &options)?)
            }
        }
    }

    /// Evaluate a tree against a record.
    ///
    /// # Errors
    ///
    /// See [`evaluate`](crate::evaluate()).
    pub fn evaluate(&self, node: &Node, record: &Record) -> Result<bool, EvalError> {
        evaluate(node, record)
    }

    /// Evaluate a tree against a JSON object of attribute values.
    ///
    /// # Errors
    ///
    /// As for [`Engine::evaluate`], plus [`EvalError::InvalidRecord`] when
    /// `data` is not an object.
    pub fn evaluate_json(&self, node: &Node, data: &serde_json::Value) -> Result<bool, EvalError> {
        evaluate(node, &Record::from_json(data)?)
    }

    /// Parse every rule under the configured limits and fold them with `op`.
    ///
    /// # Errors
    ///
    /// See [`combine`](crate::combine()).
    pub fn combine<S: AsRef<str>>(&self, rules: &[S], op: BoolOp) -> Result<Node, CombineError> {
        combine_with(rules, op, &self.config.parse_options())
    }
}
