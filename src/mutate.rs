use crate::parse::{parse_comparison, ParseError};
use crate::{BoolOp, Branch, MutationError, Node};

impl Node {
    /// Replace the connective of an operator node. Children are untouched.
    ///
    /// # Errors
    ///
    /// [`MutationError::NotAnOperatorNode`] if this node is a leaf; the node
    /// is left unchanged.
    pub fn set_operator(&mut self, new_op: BoolOp) -> Result<(), MutationError> {
        match self {
            Node::Operator { op, .. } => {
                *op = new_op;
                Ok(())
            }
            _ => Err(MutationError::NotAnOperatorNode),
        }
    }

    /// Replace the payload of a leaf.
    ///
    /// A comparison leaf takes `text` as a new `attribute relation literal`
    /// comparison. An operand leaf stores the trimmed text as its fragment.
    ///
    /// # Errors
    ///
    /// [`MutationError::NotAnOperandNode`] for an operator node and
    /// [`MutationError::InvalidOperand`] if `text` is empty or is not a single
    /// comparison. The node is left unchanged on error.
    pub fn set_operand(&mut self, text: &str) -> Result<(), MutationError> {
        match self {
            Node::Operator { .. } => Err(MutationError::NotAnOperandNode),
            Node::Comparison(comparison) => {
                *comparison = parse_comparison(text)?;
                Ok(())
            }
            Node::Operand(fragment) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(ParseError::Empty.into());
                }
                trimmed.clone_into(fragment);
                Ok(())
            }
        }
    }

    /// The node reached by following `path` from this node.
    #[must_use]
    pub fn at(&self, path: &[Branch]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, branch| node.child(*branch))
    }

    /// Mutable access to the node reached by following `path`.
    pub fn at_mut(&mut self, path: &[Branch]) -> Option<&mut Node> {
        let mut node = self;
        for branch in path {
            node = match (node, branch) {
                (Node::Operator { left, .. }, Branch::Left) => left.as_mut(),
                (Node::Operator { right, .. }, Branch::Right) => right.as_mut(),
                _ => return None,
            };
        }
        Some(node)
    }

    /// [`set_operator`](Node::set_operator) on the node at `path`.
    ///
    /// # Errors
    ///
    /// [`MutationError::NoSuchNode`] if `path` leads past a leaf, otherwise
    /// as for `set_operator`.
    pub fn set_operator_at(&mut self, path: &[Branch], op: BoolOp) -> Result<(), MutationError> {
        self.at_mut(path)
            .ok_or(MutationError::NoSuchNode)?
            .set_operator(op)
    }

    /// [`set_operand`](Node::set_operand) on the node at `path`.
    ///
    /// # Errors
    ///
    /// [`MutationError::NoSuchNode`] if `path` leads past a leaf, otherwise
    /// as for `set_operand`.
    pub fn set_operand_at(&mut self, path: &[Branch], text: &str) -> Result<(), MutationError> {
        self.at_mut(path)
            .ok_or(MutationError::NoSuchNode)?
            .set_operand(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr;
    use crate::parse::parse;

    #[test]
    fn set_operator_on_operator() {
        let mut node = parse("age > 30 AND salary > 5").unwrap();
        node.set_operator(BoolOp::Or).unwrap();
        assert_eq!(node, attr("age").gt(30_i64).or(attr("salary").gt(5_i64)));
    }

    #[test]
    fn set_operator_on_leaf_fails_and_leaves_tree_unchanged() {
        let mut node = parse("age > 30").unwrap();
        let before = node.clone();
        assert_eq!(node.set_operator(BoolOp::Or), Err(MutationError::NotAnOperatorNode));
        assert_eq!(node, before);
    }

    #[test]
    fn set_operand_on_comparison() {
        let mut node = parse("age > 30").unwrap();
        node.set_operand("age < 65").unwrap();
        assert_eq!(node, attr("age").lt(65_i64));
    }

    #[test]
    fn set_operand_rejects_bad_text() {
        let mut node = parse("age > 30").unwrap();
        assert!(matches!(
            node.set_operand("age >= 65"),
            Err(MutationError::InvalidOperand(ParseError::UnsupportedOperator { .. }))
        ));
        assert!(matches!(
            node.set_operand("age > 1 OR age < 3"),
            Err(MutationError::InvalidOperand(ParseError::Syntax { .. }))
        ));
        assert_eq!(node, attr("age").gt(30_i64));
    }

    #[test]
    fn set_operand_on_fragment() {
        let mut node = Node::Operand("age > 30".into());
        node.set_operand("  custom_function(salary) ").unwrap();
        assert_eq!(node, Node::Operand("custom_function(salary)".into()));
        assert_eq!(
            node.set_operand("  "),
            Err(MutationError::InvalidOperand(ParseError::Empty))
        );
    }

    #[test]
    fn set_operand_on_operator_fails() {
        let mut node = parse("age > 30 OR age < 3").unwrap();
        assert_eq!(
            node.set_operand("age > 1"),
            Err(MutationError::NotAnOperandNode)
        );
    }

    #[test]
    fn mutate_at_path() {
        let mut node = parse("(age > 30 OR age < 20) AND department == 'IT'").unwrap();
        node.set_operator_at(&[Branch::Left], BoolOp::And).unwrap();
        node.set_operand_at(&[Branch::Left, Branch::Right], "age < 50").unwrap();
        node.set_operand_at(&[Branch::Right], "department == 'HR'").unwrap();
        assert_eq!(
            node,
            parse("(age > 30 AND age < 50) AND department == 'HR'").unwrap()
        );
        assert_eq!(node.at(&[Branch::Right]), Some(&attr("department").eq("HR")));
    }

    #[test]
    fn path_past_leaf() {
        let mut node = parse("age > 30 AND age < 50").unwrap();
        assert!(node.at(&[Branch::Left, Branch::Left]).is_none());
        assert_eq!(
            node.set_operator_at(&[Branch::Right, Branch::Left], BoolOp::Or),
            Err(MutationError::NoSuchNode)
        );
    }
}
