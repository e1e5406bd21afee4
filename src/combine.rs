use crate::parse::{parse_with, ParseOptions};
use crate::{BoolOp, CombineError, Node};

/// Parse each rule and join them into one left-associative tree:
/// `((r1 op r2) op r3) op ...`. A single rule is returned as parsed.
///
/// # Errors
///
/// [`CombineError::NoRulesProvided`] for an empty slice and
/// [`CombineError::InvalidRule`] carrying the index of the first rule that
/// fails to parse.
pub fn combine<S: AsRef<str>>(rules: &[S], op: BoolOp) -> Result<Node, CombineError> {
    combine_with(rules, op, &ParseOptions::default())
}

/// [`combine`] with explicit parse options for every input rule.
///
/// # Errors
///
/// As for [`combine`].
pub fn combine_with<S: AsRef<str>>(
    rules: &[S],
    op: BoolOp,
    options: &ParseOptions,
) -> Result<Node, CombineError> {
    let nodes = rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            parse_with(rule.as_ref(), options)
                .map_err(|source| CombineError::InvalidRule { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;
    combine_nodes(nodes, op)
}

/// Join already built trees with the same left fold as [`combine`].
///
/// # Errors
///
/// [`CombineError::NoRulesProvided`] if `nodes` yields nothing.
pub fn combine_nodes(
    nodes: impl IntoIterator<Item = Node>,
    op: BoolOp,
) -> Result<Node, CombineError> {
    let mut nodes = nodes.into_iter();
    let first = nodes.next().ok_or(CombineError::NoRulesProvided)?;
    Ok(nodes.fold(first, |acc, node| Node::operator(op, acc, node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseError;
    use crate::{attr, evaluate, Record};

    #[test]
    fn empty_is_an_error() {
        let rules: [&str; 0] = [];
        assert_eq!(combine(&rules, BoolOp::And), Err(CombineError::NoRulesProvided));
    }

    #[test]
    fn single_rule_is_unwrapped() {
        assert_eq!(
            combine(&["age > 30"], BoolOp::Or).unwrap(),
            attr("age").gt(30_i64)
        );
    }

    #[test]
    fn three_rules_fold_left() {
        let node = combine(
            &["age > 30", "salary > 50000", "experience > 5"],
            BoolOp::And,
        )
        .unwrap();
        let expected = attr("age")
            .gt(30_i64)
            .and(attr("salary").gt(50_000_i64))
            .and(attr("experience").gt(5_i64));
        assert_eq!(node, expected);
        assert_eq!(node.right(), Some(&attr("experience").gt(5_i64)));
    }

    #[test]
    fn combined_rule_keeps_inner_grouping() {
        let node = combine(&["age > 30 OR age < 20", "department == 'IT'"], BoolOp::And).unwrap();
        assert_eq!(node.op(), Some(BoolOp::And));
        assert_eq!(node.left().and_then(Node::op), Some(BoolOp::Or));

        let record = Record::new().set("age", 25_i64).set("department", "IT");
        assert!(!evaluate(&node, &record).unwrap());
    }

    #[test]
    fn invalid_rule_reports_index() {
        assert_eq!(
            combine(&["age > 30", "age > 1", ""], BoolOp::Or),
            Err(CombineError::InvalidRule {
                index: 2,
                source: ParseError::Empty
            })
        );
    }

    #[test]
    fn combine_nodes_accepts_owned_trees() {
        let node = combine_nodes(
            vec![attr("age").gt(1_i64), attr("age").lt(9_i64)],
            BoolOp::Or,
        )
        .unwrap();
        assert_eq!(node, attr("age").gt(1_i64).or(attr("age").lt(9_i64)));
        assert_eq!(
            combine_nodes(Vec::new(), BoolOp::Or),
            Err(CombineError::NoRulesProvided)
        );
    }
}
