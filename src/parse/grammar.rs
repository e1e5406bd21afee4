use crate::{BoolOp, Comparison, Node, Value};

use super::lexer::{tokenize, Token, TokenKind};
use super::{LeafMode, ParseError, ParseOptions};

// -- Grammar (precedence: OR < AND < primary) -------------------------------
//
//   rule       := or_expr EOF
//   or_expr    := and_expr ("OR" and_expr)*
//   and_expr   := primary ("AND" primary)*
//   primary    := "(" or_expr ")" | comparison
//   comparison := IDENT relation literal
//   literal    := NUMBER | STRING | IDENT
//
// Chains fold to the left, so `a AND b AND c` is `(a AND b) AND c`.

pub(crate) struct RuleParser<'s> {
    source: &'s str,
    tokens: Vec<Token<'s>>,
    pos: usize,
    depth: usize,
    options: ParseOptions,
}

impl<'s> RuleParser<'s> {
    pub(crate) fn new(source: &'s str, options: ParseOptions) -> Result<Self, ParseError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
            options,
        })
    }

    pub(crate) fn parse_rule(mut self) -> Result<Node, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        let node = self.or_expr()?;
        match self.peek() {
            None => Ok(node),
            Some(token) => Err(self.unexpected(token, "AND or OR")),
        }
    }

    fn or_expr(&mut self) -> Result<Node, ParseError> {
        let mut node = self.and_expr()?;
        while self.eat_connective(BoolOp::Or) {
            let rhs = self.and_expr()?;
            node = Node::operator(BoolOp::Or, node, rhs);
        }
        Ok(node)
    }

    fn and_expr(&mut self) -> Result<Node, ParseError> {
        let mut node = self.primary()?;
        while self.eat_connective(BoolOp::And) {
            let rhs = self.primary()?;
            node = Node::operator(BoolOp::And, node, rhs);
        }
        Ok(node)
    }

    fn primary(&mut self) -> Result<Node, ParseError> {
        let token = self.advance("a comparison")?;
        match token.kind {
            TokenKind::LParen => {
                self.depth += 1;
                if self.depth > self.options.max_depth {
                    return Err(ParseError::TooDeep {
                        limit: self.options.max_depth,
                    });
                }
                let node = self.or_expr()?;
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => self.pos += 1,
                    Some(other) => return Err(self.unexpected(other, "')'")),
                    None => {
                        return Err(ParseError::syntax(
                            token.start,
                            "unbalanced '(': missing closing parenthesis",
                        ))
                    }
                }
                self.depth -= 1;
                Ok(node)
            }
            TokenKind::Ident(name) => self.comparison(name, token.start),
            TokenKind::Literal(_) => Err(ParseError::UnsupportedExpression {
                found: token.text(self.source).to_owned(),
                position: token.start,
            }),
            _ => Err(self.unexpected(&token, "a comparison")),
        }
    }

    fn comparison(&mut self, attribute: &'s str, start: usize) -> Result<Node, ParseError> {
        let relation = match self.peek() {
            Some(Token {
                kind: TokenKind::Relation(relation),
                ..
            }) => *relation,
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => {
                return Err(ParseError::UnsupportedExpression {
                    found: format!("{attribute}(...)"),
                    position: start,
                })
            }
            Some(other) => return Err(self.unexpected(other, "a comparison operator")),
            None => {
                return Err(ParseError::syntax(
                    self.source.len(),
                    format!("expected a comparison operator after '{attribute}'"),
                ))
            }
        };
        self.pos += 1;

        let token = self.advance("a literal")?;
        let bare_word = matches!(token.kind, TokenKind::Ident(_));
        let literal = match token.kind {
            TokenKind::Literal(value) => value,
            TokenKind::Ident(word) => Value::String(word.to_owned()),
            _ => return Err(self.unexpected(&token, "a literal")),
        };

        if let Some(Token {
            kind: TokenKind::Relation(_),
            end,
            ..
        }) = self.peek()
        {
            return Err(ParseError::UnsupportedExpression {
                found: self.source[start..*end].to_owned(),
                position: start,
            });
        }

        Ok(match self.options.leaf_mode {
            LeafMode::Structured => Node::Comparison(Comparison {
                attribute: attribute.to_owned(),
                relation,
                literal,
            }),
            // A bare word would be read as a lookup by the fragment
            // interpreter, so it is written back quoted.
            LeafMode::Fragment if bare_word => {
                Node::Operand(format!("{attribute} {relation} {literal}"))
            }
            LeafMode::Fragment => Node::Operand(self.source[start..token.end].to_owned()),
        })
    }

    // -- Token helpers ------------------------------------------------------

    fn peek(&self) -> Option<&Token<'s>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self, expected: &str) -> Result<Token<'s>, ParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            ParseError::syntax(
                self.source.len(),
                format!("unexpected end of rule, expected {expected}"),
            )
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn eat_connective(&mut self, op: BoolOp) -> bool {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Connective(found),
                ..
            }) if *found == op => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn unexpected(&self, token: &Token<'_>, expected: &str) -> ParseError {
        let text = token.text(self.source);
        match token.kind {
            TokenKind::Unsupported(op) => ParseError::UnsupportedOperator {
                operator: op.to_owned(),
                position: token.start,
            },
            _ => ParseError::syntax(token.start, format!("expected {expected}, found '{text}'")),
        }
    }
}
