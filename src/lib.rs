//! Eligibility rules as boolean trees.
//!
//! ```
//! use ruletree::{combine, evaluate, parse, BoolOp, Record};
//!
//! let rule = parse("age > 30 AND department == 'IT'").unwrap();
//! let record = Record::new()
//!     .set("age", 31_i64)
//!     .set("department", "IT")
//!     .set("salary", 60_000_i64)
//!     .set("experience", 4_i64);
//! assert!(evaluate(&rule, &record).unwrap());
//!
//! let combined = combine(&["age > 30", "salary > 50000", "experience > 5"], BoolOp::And).unwrap();
//! assert_eq!(combined.to_string(), "age > 30 AND salary > 50000 AND experience > 5");
//! assert!(!evaluate(&combined, &record).unwrap());
//! ```

mod combine;
mod engine;
mod error;
mod evaluate;
mod mutate;
pub mod parse;
pub mod serial;
mod store;
mod types;
mod validate;

pub use combine::{combine, combine_nodes, combine_with};
pub use engine::{Engine, EngineConfig};
pub use error::RuleError;
pub use evaluate::{evaluate, CUSTOM_FUNCTION, CUSTOM_FUNCTION_THRESHOLD};
pub use parse::{parse, parse_with, LeafMode, ParseError, ParseOptions};
pub use store::{RuleId, RuleStore, RuleSummary, StoreError, StoredRule};
pub use types::{
    attr, Attribute, AttrExpr, BoolOp, Branch, CombineError, Comparison, EvalError, MutationError,
    Node, Record, Relation, ValidationError, Value,
};
pub use validate::{validate, validate_node, validate_with, ValidationMode};
