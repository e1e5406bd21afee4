use std::fmt;
use std::str::FromStr;

use super::Value;
use crate::parse::ParseError;

/// Boolean connectives that may join two rule subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison relations supported in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Gt,
    Lt,
    Eq,
}

/// A structured `attribute relation literal` leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub attribute: String,
    pub relation: Relation,
    pub literal: Value,
}

/// A node of a rule AST.
///
/// Operator nodes always own exactly two children. Leaves are either a
/// structured [`Comparison`] or an unparsed `Operand` fragment produced by the
/// legacy fragment build mode (see [`LeafMode`](crate::LeafMode)).
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Operator {
        op: BoolOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Comparison(Comparison),
    Operand(String),
}

/// Selects a child of an operator node when addressing a node inside a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Left,
    Right,
}

impl BoolOp {
    pub(crate) fn apply(self, left: bool, right: bool) -> bool {
        match self {
            BoolOp::And => left && right,
            BoolOp::Or => left || right,
        }
    }
}

impl Relation {
    pub(crate) fn apply<T: PartialOrd + ?Sized>(self, left: &T, right: &T) -> bool {
        match self {
            Relation::Gt => left > right,
            Relation::Lt => left < right,
            Relation::Eq => left == right,
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "AND"),
            BoolOp::Or => write!(f, "OR"),
        }
    }
}

impl FromStr for BoolOp {
    type Err = ParseError;

    /// Accepts `and`/`or` in any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("and") {
            Ok(BoolOp::And)
        } else if trimmed.eq_ignore_ascii_case("or") {
            Ok(BoolOp::Or)
        } else {
            Err(ParseError::UnsupportedOperator {
                operator: trimmed.to_owned(),
                position: 0,
            })
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Gt => write!(f, ">"),
            Relation::Lt => write!(f, "<"),
            Relation::Eq => write!(f, "=="),
        }
    }
}

impl FromStr for Relation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(Relation::Gt),
            "<" => Ok(Relation::Lt),
            "==" => Ok(Relation::Eq),
            other => Err(ParseError::UnsupportedOperator {
                operator: other.to_owned(),
                position: 0,
            }),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.relation, self.literal)
    }
}

/// Renders the tree back into rule source. Parentheses are emitted wherever
/// the default left-associative reading would produce a different tree, so
/// structured trees reparse to themselves.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Operator { op, .. } => {
                let (first, rights) = self.spine(*op);
                write_child(f, first, *op, Branch::Left)?;
                for right in rights.into_iter().rev() {
                    write!(f, " {op} ")?;
                    write_child(f, right, *op, Branch::Right)?;
                }
                Ok(())
            }
            Node::Comparison(comparison) => write!(f, "{comparison}"),
            Node::Operand(fragment) => write!(f, "{fragment}"),
        }
    }
}

fn write_child(f: &mut fmt::Formatter<'_>, child: &Node, parent: BoolOp, side: Branch) -> fmt::Result {
    match child {
        Node::Operator { op, .. } if side == Branch::Left && *op == parent => write!(f, "{child}"),
        Node::Operator { .. } => write!(f, "({child})"),
        _ => write!(f, "{child}"),
    }
}

impl Node {
    /// Build an operator node owning both children.
    #[must_use]
    pub fn operator(op: BoolOp, left: Node, right: Node) -> Node {
        Node::Operator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn and(self, other: Node) -> Node {
        Node::operator(BoolOp::And, self, other)
    }

    #[must_use]
    pub fn or(self, other: Node) -> Node {
        Node::operator(BoolOp::Or, self, other)
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Node::Operator { .. })
    }

    /// The connective of an operator node, `None` for leaves.
    #[must_use]
    pub fn op(&self) -> Option<BoolOp> {
        match self {
            Node::Operator { op, .. } => Some(*op),
            _ => None,
        }
    }

    #[must_use]
    pub fn left(&self) -> Option<&Node> {
        self.child(Branch::Left)
    }

    #[must_use]
    pub fn right(&self) -> Option<&Node> {
        self.child(Branch::Right)
    }

    #[must_use]
    pub fn child(&self, branch: Branch) -> Option<&Node> {
        match (self, branch) {
            (Node::Operator { left, .. }, Branch::Left) => Some(left),
            (Node::Operator { right, .. }, Branch::Right) => Some(right),
            _ => None,
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Node::Operator { left, right, .. } = node {
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
        deepest
    }

    /// Leaves in left-to-right order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Operator { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
                leaf => out.push(leaf),
            }
        }
        out
    }

    /// Split the left spine of `op` operators starting at this node into its
    /// innermost left operand and the right operands, outermost first.
    pub(crate) fn spine(&self, op: BoolOp) -> (&Node, Vec<&Node>) {
        let mut rights = Vec::new();
        let mut cursor = self;
        while let Node::Operator {
            op: found,
            left,
            right,
        } = cursor
        {
            if *found != op {
                break;
            }
            rights.push(right.as_ref());
            cursor = left;
        }
        (cursor, rights)
    }
}

/// Unlinks children onto a heap stack so dropping a long combined chain does
/// not recurse once per level.
impl Drop for Node {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        take_children(self, &mut stack);
        while let Some(mut node) = stack.pop() {
            take_children(&mut node, &mut stack);
        }
    }
}

fn take_children(node: &mut Node, stack: &mut Vec<Node>) {
    if let Node::Operator { left, right, .. } = node {
        for child in [left, right] {
            if !child.is_leaf() {
                stack.push(std::mem::replace(child.as_mut(), Node::Operand(String::new())));
            }
        }
    }
}

/// Intermediate builder for comparison leaves.
/// Created by [`attr()`]; requires a relation method to produce a [`Node`].
#[derive(Debug, Clone)]
pub struct AttrExpr {
    name: String,
}

impl AttrExpr {
    #[must_use]
    pub fn gt(self, literal: impl Into<Value>) -> Node {
        self.compare(Relation::Gt, literal.into())
    }

    #[must_use]
    pub fn lt(self, literal: impl Into<Value>) -> Node {
        self.compare(Relation::Lt, literal.into())
    }

    #[must_use]
    pub fn eq(self, literal: impl Into<Value>) -> Node {
        self.compare(Relation::Eq, literal.into())
    }

    fn compare(self, relation: Relation, literal: Value) -> Node {
        Node::Comparison(Comparison {
            attribute: self.name,
            relation,
            literal,
        })
    }
}

#[must_use]
pub fn attr(name: &str) -> AttrExpr {
    AttrExpr {
        name: name.to_owned(),
    }
}
