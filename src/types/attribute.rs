use std::fmt;

use super::Value;

/// The fixed set of attributes a rule may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Age,
    Department,
    Salary,
    Experience,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Age,
        Attribute::Department,
        Attribute::Salary,
        Attribute::Experience,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Age => "age",
            Attribute::Department => "department",
            Attribute::Salary => "salary",
            Attribute::Experience => "experience",
        }
    }

    /// Look up an attribute by its exact (case-sensitive) name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Attribute> {
        Attribute::ALL.into_iter().find(|a| a.as_str() == name)
    }

    #[must_use]
    pub fn is_known(name: &str) -> bool {
        Attribute::from_name(name).is_some()
    }

    /// Describes the type a record value is coerced to before evaluation.
    #[must_use]
    pub fn expected_type(self) -> &'static str {
        match self {
            Attribute::Age | Attribute::Experience => "integer",
            Attribute::Salary => "float",
            Attribute::Department => "string",
        }
    }

    /// Coerce a record value to this attribute's evaluation type.
    /// Returns `None` when the value cannot be converted.
    ///
    /// `age` and `experience` become integers (floats truncate toward zero,
    /// strings must hold an integer), `salary` becomes a float, `department`
    /// is passed through untouched.
    #[must_use]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match self {
            Attribute::Age | Attribute::Experience => to_int(value).map(Value::Int),
            Attribute::Salary => to_float(value).map(Value::Float),
            Attribute::Department => Some(value.clone()),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(*v),
        Value::Bool(v) => Some(i64::from(*v)),
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
        Value::Float(v) if v.is_finite() && *v >= i64::MIN as f64 && *v < i64::MAX as f64 => {
            Some(v.trunc() as i64)
        }
        Value::Float(_) => None,
        Value::String(s) => s.trim().parse().ok(),
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_f64(),
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
