use winnow::combinator::{alt, cut_err, opt};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::{BoolOp, Relation, Value};

use super::ParseError;

// -- Tokens -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind<'s> {
    Ident(&'s str),
    Literal(Value),
    Relation(Relation),
    Connective(BoolOp),
    /// Operators and keywords that are recognised only so they can be rejected.
    Unsupported(&'s str),
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token<'s> {
    pub(crate) kind: TokenKind<'s>,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Token<'_> {
    pub(crate) fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Raw lexemes as recognised by the combinators, before classification.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme<'s> {
    Word(&'s str),
    Number(&'s str),
    Quoted(String),
    Relation(Relation),
    Unsupported(&'s str),
    LParen,
    RParen,
}

// -- Lexemes ----------------------------------------------------------------

fn word<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn number<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .parse_next(input)
}

fn quote_char(input: &mut &str) -> ModalResult<char> {
    one_of(['"', '\'']).parse_next(input)
}

fn next_char(input: &mut &str) -> ModalResult<char> {
    any.parse_next(input)
}

/// Single- or double-quoted string with `\` escapes. Running out of input
/// before the closing quote is a cut error.
fn quoted(input: &mut &str) -> ModalResult<String> {
    let quote = quote_char.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(next_char).parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc = cut_err(next_char).parse_next(input)?;
                match esc {
                    '"' | '\'' | '\\' => s.push(esc),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn lexeme<'s>(input: &mut &'s str) -> ModalResult<Lexeme<'s>> {
    alt((
        quoted.map(Lexeme::Quoted),
        number.map(Lexeme::Number),
        word.map(Lexeme::Word),
        "==".value(Lexeme::Relation(Relation::Eq)),
        alt((">=", "<=", "!=", "&&", "||", "**", "//")).map(Lexeme::Unsupported),
        '>'.value(Lexeme::Relation(Relation::Gt)),
        '<'.value(Lexeme::Relation(Relation::Lt)),
        '('.value(Lexeme::LParen),
        ')'.value(Lexeme::RParen),
        one_of(['=', '!', '&', '|', '+', '-', '*', '/', '%', '^', '~'])
            .take()
            .map(Lexeme::Unsupported),
    ))
    .parse_next(input)
}

// -- Classification ---------------------------------------------------------

fn classify<'s>(lexeme: Lexeme<'s>, start: usize) -> Result<TokenKind<'s>, ParseError> {
    Ok(match lexeme {
        Lexeme::Word("AND" | "and") => TokenKind::Connective(BoolOp::And),
        Lexeme::Word("OR" | "or") => TokenKind::Connective(BoolOp::Or),
        Lexeme::Word(w @ ("NOT" | "not" | "XOR" | "xor" | "in" | "is")) => {
            TokenKind::Unsupported(w)
        }
        Lexeme::Word("True") => TokenKind::Literal(Value::Bool(true)),
        Lexeme::Word("False") => TokenKind::Literal(Value::Bool(false)),
        Lexeme::Word(w) => TokenKind::Ident(w),
        Lexeme::Number(n) if n.contains('.') => {
            let f: f64 = n.parse().map_err(|_| {
                ParseError::syntax(start, format!("invalid number literal '{n}'"))
            })?;
            TokenKind::Literal(Value::Float(f))
        }
        Lexeme::Number(n) => {
            let i: i64 = n.parse().map_err(|_| {
                ParseError::syntax(start, format!("integer literal '{n}' is out of range"))
            })?;
            TokenKind::Literal(Value::Int(i))
        }
        Lexeme::Quoted(s) => TokenKind::Literal(Value::String(s)),
        Lexeme::Relation(r) => TokenKind::Relation(r),
        Lexeme::Unsupported(op) => TokenKind::Unsupported(op),
        Lexeme::LParen => TokenKind::LParen,
        Lexeme::RParen => TokenKind::RParen,
    })
}

/// Split rule source into tokens. Whitespace between tokens is insignificant.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseError> {
    let mut input = source;
    let mut tokens = Vec::new();
    loop {
        input = input.trim_start();
        if input.is_empty() {
            return Ok(tokens);
        }
        let start = source.len() - input.len();
        let rest = input;
        let lexeme = lexeme
            .parse_next(&mut input)
            .map_err(|_| lex_error(rest, start))?;
        let end = source.len() - input.len();
        tokens.push(Token {
            kind: classify(lexeme, start)?,
            start,
            end,
        });
    }
}

fn lex_error(rest: &str, start: usize) -> ParseError {
    match rest.chars().next() {
        Some('"' | '\'') => ParseError::syntax(start, "unterminated string literal"),
        Some(c) => ParseError::syntax(start, format!("unexpected character '{c}'")),
        None => ParseError::syntax(start, "unexpected end of input"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind<'_>> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn simple_comparison() {
        assert_eq!(
            kinds("age > 30"),
            vec![
                TokenKind::Ident("age"),
                TokenKind::Relation(Relation::Gt),
                TokenKind::Literal(Value::Int(30)),
            ]
        );
    }

    #[test]
    fn whitespace_is_optional() {
        assert_eq!(kinds("age>30"), kinds("  age   >\t30 "));
    }

    #[test]
    fn connectives_in_both_cases() {
        assert_eq!(
            kinds("a AND b and c OR d or e"),
            vec![
                TokenKind::Ident("a"),
                TokenKind::Connective(BoolOp::And),
                TokenKind::Ident("b"),
                TokenKind::Connective(BoolOp::And),
                TokenKind::Ident("c"),
                TokenKind::Connective(BoolOp::Or),
                TokenKind::Ident("d"),
                TokenKind::Connective(BoolOp::Or),
                TokenKind::Ident("e"),
            ]
        );
    }

    #[test]
    fn keywords_are_whole_words() {
        assert_eq!(kinds("android"), vec![TokenKind::Ident("android")]);
        assert_eq!(kinds("order"), vec![TokenKind::Ident("order")]);
    }

    #[test]
    fn number_literals() {
        assert_eq!(
            kinds("1 2.5 -3 -0.25"),
            vec![
                TokenKind::Literal(Value::Int(1)),
                TokenKind::Literal(Value::Float(2.5)),
                TokenKind::Literal(Value::Int(-3)),
                TokenKind::Literal(Value::Float(-0.25)),
            ]
        );
    }

    #[test]
    fn minus_without_digits_is_unsupported() {
        assert_eq!(
            kinds("age - 5"),
            vec![
                TokenKind::Ident("age"),
                TokenKind::Unsupported("-"),
                TokenKind::Literal(Value::Int(5)),
            ]
        );
    }

    #[test]
    fn quoted_strings() {
        assert_eq!(
            kinds(r#"'IT' "HR" 'O\'Brien'"#),
            vec![
                TokenKind::Literal(Value::from("IT")),
                TokenKind::Literal(Value::from("HR")),
                TokenKind::Literal(Value::from("O'Brien")),
            ]
        );
    }

    #[test]
    fn rejected_operators_are_tokens() {
        assert_eq!(
            kinds(">= <= != && || = ! NOT xor"),
            vec![
                TokenKind::Unsupported(">="),
                TokenKind::Unsupported("<="),
                TokenKind::Unsupported("!="),
                TokenKind::Unsupported("&&"),
                TokenKind::Unsupported("||"),
                TokenKind::Unsupported("="),
                TokenKind::Unsupported("!"),
                TokenKind::Unsupported("NOT"),
                TokenKind::Unsupported("xor"),
            ]
        );
    }

    #[test]
    fn token_spans() {
        let source = "salary  < 10";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].text(source), "salary");
        assert_eq!(tokens[1].start, 8);
        assert_eq!(tokens[2].text(source), "10");
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(
            tokenize("department == 'IT"),
            Err(ParseError::syntax(14, "unterminated string literal"))
        );
    }

    #[test]
    fn unexpected_character() {
        assert_eq!(
            tokenize("age > 30;"),
            Err(ParseError::syntax(8, "unexpected character ';'"))
        );
    }

    #[test]
    fn integer_out_of_range() {
        assert!(matches!(
            tokenize("age > 99999999999999999999"),
            Err(ParseError::Syntax { position: 6, .. })
        ));
    }

    #[test]
    fn boolean_constants() {
        assert_eq!(
            kinds("True False true"),
            vec![
                TokenKind::Literal(Value::Bool(true)),
                TokenKind::Literal(Value::Bool(false)),
                TokenKind::Ident("true"),
            ]
        );
    }
}
