//! Structured text encoding of rule trees.
//!
//! Trees are stored as JSON tagged by `"type"`:
//!
//! ```text
//! {"type":"operator","op":"AND","operands":[<node>, <node>, ...]}
//! {"type":"comparison","attribute":"age","relation":">","literal":30}
//! {"type":"operand","expression":"age > 30"}
//! ```
//!
//! The left spine of same-connective operator nodes is written as a single
//! `operands` list and rebuilt by a left fold, so combined chains stay flat
//! on disk and decode to the identical tree. Right children are never merged.
//!
//! The decoder also accepts the older `{"type", "value", "left", "right"}`
//! shape, whose leaves become operand fragments.

#[cfg(feature = "binary-cache")]
pub(crate) mod snapshot;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BoolOp, Comparison, Node, Relation, Value};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when encoding a rule tree or a store snapshot.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("literal compared with '{attribute}' is not a finite number")]
    NonFiniteLiteral { attribute: String },

    #[cfg(feature = "binary-cache")]
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[cfg(feature = "binary-cache")]
    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when decoding a rule tree or a store snapshot.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("failed to decode rule JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[cfg(feature = "binary-cache")]
    #[error("not a ruletree snapshot: invalid magic bytes")]
    BadMagic,

    #[cfg(feature = "binary-cache")]
    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[cfg(feature = "binary-cache")]
    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[cfg(feature = "binary-cache")]
    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[cfg(feature = "binary-cache")]
    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[cfg(feature = "binary-cache")]
    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SerializedNode {
    Operator {
        op: SerializedBoolOp,
        operands: Vec<SerializedNode>,
    },
    Comparison {
        attribute: String,
        relation: SerializedRelation,
        literal: SerializedLiteral,
    },
    Operand {
        expression: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum SerializedBoolOp {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum SerializedRelation {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum SerializedLiteral {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Node shape written by earlier versions of the rule service.
#[derive(Debug, Deserialize)]
struct LegacyNode {
    #[serde(rename = "type")]
    kind: String,
    value: Option<String>,
    left: Option<Box<LegacyNode>>,
    right: Option<Box<LegacyNode>>,
}

// ---------------------------------------------------------------------------
// Scalar conversion
// ---------------------------------------------------------------------------

impl From<BoolOp> for SerializedBoolOp {
    fn from(op: BoolOp) -> Self {
        match op {
            BoolOp::And => SerializedBoolOp::And,
            BoolOp::Or => SerializedBoolOp::Or,
        }
    }
}

impl From<SerializedBoolOp> for BoolOp {
    fn from(op: SerializedBoolOp) -> Self {
        match op {
            SerializedBoolOp::And => BoolOp::And,
            SerializedBoolOp::Or => BoolOp::Or,
        }
    }
}

impl From<Relation> for SerializedRelation {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::Gt => SerializedRelation::Gt,
            Relation::Lt => SerializedRelation::Lt,
            Relation::Eq => SerializedRelation::Eq,
        }
    }
}

impl From<SerializedRelation> for Relation {
    fn from(relation: SerializedRelation) -> Self {
        match relation {
            SerializedRelation::Gt => Relation::Gt,
            SerializedRelation::Lt => Relation::Lt,
            SerializedRelation::Eq => Relation::Eq,
        }
    }
}

fn serialize_literal(attribute: &str, value: &Value) -> Result<SerializedLiteral, SerializeError> {
    Ok(match value {
        Value::Int(v) => SerializedLiteral::Int(*v),
        Value::Float(v) if v.is_finite() => SerializedLiteral::Float(*v),
        Value::Float(_) => {
            return Err(SerializeError::NonFiniteLiteral {
                attribute: attribute.to_owned(),
            })
        }
        Value::Bool(v) => SerializedLiteral::Bool(*v),
        Value::String(v) => SerializedLiteral::Str(v.clone()),
    })
}

fn deserialize_literal(literal: SerializedLiteral) -> Value {
    match literal {
        SerializedLiteral::Int(v) => Value::Int(v),
        SerializedLiteral::Float(v) => Value::Float(v),
        SerializedLiteral::Bool(v) => Value::Bool(v),
        SerializedLiteral::Str(v) => Value::String(v),
    }
}

// ---------------------------------------------------------------------------
// Flattening (left spine -> operand list)
// ---------------------------------------------------------------------------

fn flatten(node: &Node) -> Result<SerializedNode, SerializeError> {
    match node {
        Node::Operator { op, .. } => {
            let (first, mut spine) = node.spine(*op);
            spine.push(first);

            let operands = spine
                .into_iter()
                .rev()
                .map(flatten)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SerializedNode::Operator {
                op: (*op).into(),
                operands,
            })
        }
        Node::Comparison(comparison) => Ok(SerializedNode::Comparison {
            attribute: comparison.attribute.clone(),
            relation: comparison.relation.into(),
            literal: serialize_literal(&comparison.attribute, &comparison.literal)?,
        }),
        Node::Operand(expression) => Ok(SerializedNode::Operand {
            expression: expression.clone(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Unflattening (operand list -> left-associative binary tree)
// ---------------------------------------------------------------------------

fn unflatten(node: SerializedNode) -> Result<Node, DeserializeError> {
    match node {
        SerializedNode::Operator { op, operands } => {
            if operands.len() < 2 {
                return Err(DeserializeError::Validation(format!(
                    "operator node has {} operand(s), needs at least 2",
                    operands.len()
                )));
            }
            let op = BoolOp::from(op);
            let mut operands = operands.into_iter().map(unflatten);
            let first = operands.next().ok_or_else(|| {
                DeserializeError::Validation("operator node has no operands".to_owned())
            })??;
            operands.try_fold(first, |acc, child| Ok(Node::operator(op, acc, child?)))
        }
        SerializedNode::Comparison {
            attribute,
            relation,
            literal,
        } => {
            if !is_identifier(&attribute) {
                return Err(DeserializeError::Validation(format!(
                    "'{attribute}' is not a valid attribute name"
                )));
            }
            Ok(Node::Comparison(Comparison {
                attribute,
                relation: relation.into(),
                literal: deserialize_literal(literal),
            }))
        }
        SerializedNode::Operand { expression } => operand(expression),
    }
}

fn unflatten_legacy(node: LegacyNode) -> Result<Node, DeserializeError> {
    match (node.kind.as_str(), node.left, node.right) {
        ("operator", Some(left), Some(right)) => {
            let op = node
                .value
                .as_deref()
                .unwrap_or_default()
                .parse::<BoolOp>()
                .map_err(|err| DeserializeError::Validation(err.to_string()))?;
            Ok(Node::operator(
                op,
                unflatten_legacy(*left)?,
                unflatten_legacy(*right)?,
            ))
        }
        ("operator", _, _) => Err(DeserializeError::Validation(
            "operator node needs both a left and a right child".to_owned(),
        )),
        ("operand", None, None) => operand(node.value.unwrap_or_default()),
        ("operand", _, _) => Err(DeserializeError::Validation(
            "operand node cannot have children".to_owned(),
        )),
        (other, _, _) => Err(DeserializeError::Validation(format!(
            "unknown node type '{other}'"
        ))),
    }
}

fn operand(expression: String) -> Result<Node, DeserializeError> {
    if expression.trim().is_empty() {
        return Err(DeserializeError::Validation(
            "operand node has an empty expression".to_owned(),
        ));
    }
    Ok(Node::Operand(expression))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

impl Node {
    /// Encode the tree as JSON text.
    ///
    /// # Errors
    ///
    /// [`SerializeError::NonFiniteLiteral`] if a comparison literal is NaN or
    /// infinite, since JSON has no representation for it.
    pub fn to_json(&self) -> Result<String, SerializeError> {
        Ok(serde_json::to_string(&flatten(self)?)?)
    }

    /// Decode a tree previously written by [`Node::to_json`], or by the older
    /// `{"type","value","left","right"}` encoding.
    ///
    /// Older operand values become [`Node::Operand`] leaves holding the text
    /// verbatim. Only rule-source text such as `age > 30` can be evaluated
    /// later. Values that hold a syntax-tree dump instead, like
    /// `Name(id='age', ctx=Load()) Gt() Constant(value=30)`, still decode, but
    /// evaluating them fails with [`EvalError::UnsupportedExpression`] and
    /// structural validation rejects them as [`ValidationError::Malformed`].
    ///
    /// [`EvalError::UnsupportedExpression`]: crate::EvalError::UnsupportedExpression
    /// [`ValidationError::Malformed`]: crate::ValidationError::Malformed
    ///
    /// # Errors
    ///
    /// [`DeserializeError::Json`] for malformed JSON or unknown tags and
    /// [`DeserializeError::Validation`] for structurally invalid trees.
    pub fn from_json(text: &str) -> Result<Node, DeserializeError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        if json.get("value").is_some() {
            unflatten_legacy(serde_json::from_value(json)?)
        } else {
            unflatten(serde_json::from_value(json)?)
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
