//! Interpreter for operand fragments.
//!
//! A fragment is the raw text of a comparison kept by the fragment leaf mode.
//! It is evaluated over a closed environment: the record's bindings, the
//! `True`/`False` constants and a single helper function. Nothing else is
//! reachable.
//!
//! ```text
//! or   := and ("OR" and)*
//! and  := cmp ("AND" cmp)*
//! cmp  := term (relation term)?
//! term := IDENT | IDENT "(" or ")" | NUMBER | STRING | "(" or ")"
//! ```

use crate::parse::lexer::{tokenize, Token, TokenKind};
use crate::parse::{ParseError, DEFAULT_MAX_DEPTH};
use crate::{BoolOp, EvalError, Record, Relation, Value};

/// Name of the only function a fragment may call.
pub const CUSTOM_FUNCTION: &str = "custom_function";

/// `custom_function(x)` is `x > CUSTOM_FUNCTION_THRESHOLD`.
pub const CUSTOM_FUNCTION_THRESHOLD: i64 = 1000;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Lookup(String),
    Literal(Value),
    Call {
        name: String,
        arg: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        relation: Relation,
        right: Box<Expr>,
        /// Source text of the left operand, for error reporting.
        subject: String,
    },
    Logic {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// A name a fragment refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reference {
    Attribute(String),
    Function(String),
}

/// Evaluate a fragment against an already coerced record.
pub(crate) fn evaluate(fragment: &str, record: &Record) -> Result<bool, EvalError> {
    let expr = FragmentParser::new(fragment)
        .and_then(FragmentParser::parse)
        .map_err(|err| EvalError::UnsupportedExpression {
            detail: format!("'{fragment}': {err}"),
        })?;
    match eval(&expr, record)? {
        Value::Bool(result) => Ok(result),
        other => Err(EvalError::UnsupportedExpression {
            detail: format!(
                "'{fragment}' evaluates to a {} instead of a boolean",
                other.type_name()
            ),
        }),
    }
}

/// Every identifier a fragment looks up or calls, in source order.
pub(crate) fn references(fragment: &str) -> Result<Vec<Reference>, ParseError> {
    let expr = FragmentParser::new(fragment)?.parse()?;
    let mut out = Vec::new();
    collect_references(&expr, &mut out);
    Ok(out)
}

fn collect_references(expr: &Expr, out: &mut Vec<Reference>) {
    match expr {
        Expr::Lookup(name) => out.push(Reference::Attribute(name.clone())),
        Expr::Literal(_) => {}
        Expr::Call { name, arg } => {
            out.push(Reference::Function(name.clone()));
            collect_references(arg, out);
        }
        Expr::Compare { left, right, .. } | Expr::Logic { left, right, .. } => {
            collect_references(left, out);
            collect_references(right, out);
        }
    }
}

// -- Evaluation -------------------------------------------------------------

fn eval(expr: &Expr, record: &Record) -> Result<Value, EvalError> {
    match expr {
        Expr::Lookup(name) => {
            record
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::MissingAttribute {
                    attribute: name.clone(),
                })
        }
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Call { name, arg } => {
            if name != CUSTOM_FUNCTION {
                return Err(EvalError::UnsupportedExpression {
                    detail: format!("call to '{name}' is not allowed"),
                });
            }
            custom_function(&eval(arg, record)?)
        }
        Expr::Compare {
            left,
            relation,
            right,
            subject,
        } => {
            let lhs = eval(left, record)?;
            let rhs = eval(right, record)?;
            lhs.compare(*relation, &rhs)
                .map(Value::Bool)
                .ok_or_else(|| EvalError::TypeMismatch {
                    attribute: subject.clone(),
                    relation: *relation,
                })
        }
        Expr::Logic { op, left, right } => {
            let lhs = eval(left, record)?;
            let rhs = eval(right, record)?;
            match (lhs, rhs) {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(op.apply(a, b))),
                (a, b) => Err(EvalError::UnsupportedExpression {
                    detail: format!(
                        "'{op}' needs boolean operands, found {} and {}",
                        a.type_name(),
                        b.type_name()
                    ),
                }),
            }
        }
    }
}

fn custom_function(arg: &Value) -> Result<Value, EvalError> {
    match arg {
        Value::Int(v) => Ok(Value::Bool(*v > CUSTOM_FUNCTION_THRESHOLD)),
        #[allow(clippy::cast_precision_loss)]
        Value::Float(v) => Ok(Value::Bool(*v > CUSTOM_FUNCTION_THRESHOLD as f64)),
        other => Err(EvalError::UnsupportedExpression {
            detail: format!(
                "{CUSTOM_FUNCTION} expects a number, found a {}",
                other.type_name()
            ),
        }),
    }
}

// -- Parsing ----------------------------------------------------------------

struct FragmentParser<'s> {
    source: &'s str,
    tokens: Vec<Token<'s>>,
    pos: usize,
    depth: usize,
}

impl<'s> FragmentParser<'s> {
    fn new(source: &'s str) -> Result<Self, ParseError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        let expr = self.or_expr()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some(token) => Err(self.unexpected(token)),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and_expr()?;
        while self.eat(|kind| *kind == TokenKind::Connective(BoolOp::Or)) {
            let right = self.and_expr()?;
            expr = Expr::Logic {
                op: BoolOp::Or,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.cmp_expr()?;
        while self.eat(|kind| *kind == TokenKind::Connective(BoolOp::And)) {
            let right = self.cmp_expr()?;
            expr = Expr::Logic {
                op: BoolOp::And,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn cmp_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.tokens.get(self.pos).map_or(self.source.len(), |t| t.start);
        let left = self.term()?;
        let left_end = self.tokens[self.pos - 1].end;

        let relation = match self.tokens.get(self.pos) {
            Some(Token {
                kind: TokenKind::Relation(relation),
                ..
            }) => *relation,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.term()?;

        if let Some(Token {
            kind: TokenKind::Relation(_),
            end,
            ..
        }) = self.tokens.get(self.pos)
        {
            return Err(ParseError::UnsupportedExpression {
                found: self.source[start..*end].to_owned(),
                position: start,
            });
        }

        Ok(Expr::Compare {
            left: Box::new(left),
            relation,
            right: Box::new(right),
            subject: self.source[start..left_end].to_owned(),
        })
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            ParseError::syntax(self.source.len(), "unexpected end of expression")
        })?;
        self.pos += 1;
        match token.kind {
            TokenKind::LParen => self.group(token.start),
            TokenKind::Ident(name) => {
                if self.eat(|kind| *kind == TokenKind::LParen) {
                    let arg = self.group(token.start)?;
                    Ok(Expr::Call {
                        name: name.to_owned(),
                        arg: Box::new(arg),
                    })
                } else {
                    Ok(Expr::Lookup(name.to_owned()))
                }
            }
            TokenKind::Literal(value) => Ok(Expr::Literal(value)),
            _ => Err(self.unexpected(&token)),
        }
    }

    /// The rest of a parenthesized group whose `(` was just consumed.
    fn group(&mut self, open: usize) -> Result<Expr, ParseError> {
        self.depth += 1;
        if self.depth > DEFAULT_MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: DEFAULT_MAX_DEPTH,
            });
        }
        let expr = self.or_expr()?;
        if !self.eat(|kind| *kind == TokenKind::RParen) {
            return Err(match self.tokens.get(self.pos) {
                Some(token) => self.unexpected(token),
                None => ParseError::syntax(open, "unbalanced '(': missing closing parenthesis"),
            });
        }
        self.depth -= 1;
        Ok(expr)
    }

    fn eat(&mut self, pred: impl Fn(&TokenKind<'s>) -> bool) -> bool {
        match self.tokens.get(self.pos) {
            Some(token) if pred(&token.kind) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn unexpected(&self, token: &Token<'_>) -> ParseError {
        match token.kind {
            TokenKind::Unsupported(op) => ParseError::UnsupportedOperator {
                operator: op.to_owned(),
                position: token.start,
            },
            _ => ParseError::syntax(
                token.start,
                format!("unexpected '{}'", token.text(self.source)),
            ),
        }
    }
}
