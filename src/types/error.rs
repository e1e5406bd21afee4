use thiserror::Error;

use super::Relation;
use crate::parse::ParseError;

/// Errors produced while evaluating a rule against a record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("attribute '{attribute}' is missing from the record")]
    MissingAttribute { attribute: String },

    #[error("field '{field}' has an invalid data type: expected {expected}")]
    InvalidDataType {
        field: String,
        expected: &'static str,
    },

    #[error("cannot compare '{attribute}' with '{relation}' across a number and a string")]
    TypeMismatch { attribute: String, relation: Relation },

    #[error("unsupported expression: {detail}")]
    UnsupportedExpression { detail: String },

    #[error("record must be a mapping of attribute names to values")]
    InvalidRecord,
}

/// Errors produced by the structural and substring validators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown attribute '{attribute}'")]
    UnknownAttribute { attribute: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("rule references none of the recognized attributes")]
    NoRecognizedAttribute,

    #[error(transparent)]
    Malformed(#[from] ParseError),
}

/// Errors produced when editing a node in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    #[error("node is not an operator node")]
    NotAnOperatorNode,

    #[error("node is not an operand node")]
    NotAnOperandNode,

    #[error("no node at the given path")]
    NoSuchNode,

    #[error("invalid operand: {0}")]
    InvalidOperand(#[from] ParseError),
}

/// Errors produced when combining several rules into one tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombineError {
    #[error("no rules provided to combine")]
    NoRulesProvided,

    #[error("rule {index} could not be parsed: {source}")]
    InvalidRule { index: usize, source: ParseError },
}
