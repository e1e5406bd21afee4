mod attribute;
mod error;
mod node;
mod record;
mod value;

pub use attribute::Attribute;
pub use error::{CombineError, EvalError, MutationError, ValidationError};
pub use node::{attr, AttrExpr, BoolOp, Branch, Comparison, Node, Relation};
pub use record::Record;
pub use value::Value;
