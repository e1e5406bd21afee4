pub(crate) mod fragment;

use crate::{BoolOp, Comparison, EvalError, Node, Record};

pub use fragment::{CUSTOM_FUNCTION, CUSTOM_FUNCTION_THRESHOLD};

/// Evaluate a rule tree against a record.
///
/// Whitelisted numeric attributes present in the record are coerced first
/// (`age`/`experience` to integers, `salary` to a float). Both sides of every
/// connective are evaluated, so an error anywhere in the tree surfaces even
/// when the other side already decides the result.
///
/// # Errors
///
/// - [`EvalError::InvalidDataType`] if a numeric attribute cannot be coerced.
/// - [`EvalError::MissingAttribute`] if a referenced attribute is absent.
/// - [`EvalError::TypeMismatch`] when ordering a number against a string.
/// - [`EvalError::UnsupportedExpression`] when an operand fragment falls
///   outside the restricted grammar or does not yield a boolean.
pub fn evaluate(node: &Node, record: &Record) -> Result<bool, EvalError> {
    let record = record.coerced()?;
    eval_node(node, &record)
}

fn eval_node(node: &Node, record: &Record) -> Result<bool, EvalError> {
    match node {
        Node::Operator { op, .. } => eval_chain(node, *op, record),
        Node::Comparison(comparison) => eval_comparison(comparison, record),
        Node::Operand(text) => fragment::evaluate(text, record),
    }
}

/// Combined rules grow long left spines of one connective; walk those
/// iteratively and only recurse into right children and mixed operators.
fn eval_chain(node: &Node, op: BoolOp, record: &Record) -> Result<bool, EvalError> {
    let (first, spine) = node.spine(op);
    let mut acc = eval_node(first, record)?;
    for right in spine.into_iter().rev() {
        let rhs = eval_node(right, record)?;
        acc = op.apply(acc, rhs);
    }
    Ok(acc)
}

fn eval_comparison(comparison: &Comparison, record: &Record) -> Result<bool, EvalError> {
    let value = record
        .get(&comparison.attribute)
        .ok_or_else(|| EvalError::MissingAttribute {
            attribute: comparison.attribute.clone(),
        })?;
    value
        .compare(comparison.relation, &comparison.literal)
        .ok_or_else(|| EvalError::TypeMismatch {
            attribute: comparison.attribute.clone(),
            relation: comparison.relation,
        })
}
