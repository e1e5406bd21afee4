use thiserror::Error;

use crate::parse::ParseError;
use crate::serial::{DeserializeError, SerializeError};
use crate::{CombineError, EvalError, MutationError, ValidationError};

/// Unified error type covering every rule operation.
///
/// Returned by [`Engine::build()`](crate::Engine::build) and used by
/// [`RuleStore`](crate::RuleStore) to wrap component failures.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Combine(#[from] CombineError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
}
