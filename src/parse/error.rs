use thiserror::Error;

/// Errors produced when parsing rule source. Positions are byte offsets into
/// the source string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("rule is empty")]
    Empty,

    #[error("syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unsupported operator '{operator}' at {position}")]
    UnsupportedOperator { operator: String, position: usize },

    #[error("unsupported expression '{found}' at {position}: left side of a comparison must be an attribute name")]
    UnsupportedExpression { found: String, position: usize },

    #[error("rule nests deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("rule is {len} bytes long, limit is {limit}")]
    TooLong { len: usize, limit: usize },
}

impl ParseError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            position,
            message: message.into(),
        }
    }
}
