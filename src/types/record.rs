use std::collections::HashMap;

use super::{Attribute, EvalError, Value};

/// The data a rule is evaluated against: attribute names mapped to [`Value`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    data: HashMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the record for chaining.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Insert a field (mutable reference version).
    pub fn insert(&mut self, name: &str, value: Value) {
        self.data.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a record from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidRecord`] if `json` is not an object and
    /// [`EvalError::InvalidDataType`] for a field holding `null`, an array or
    /// a nested object.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, EvalError> {
        let object = json.as_object().ok_or(EvalError::InvalidRecord)?;
        let mut record = Record::new();
        for (name, value) in object {
            let value = match value {
                serde_json::Value::Bool(b) => Value::Bool(*b),
                serde_json::Value::String(s) => Value::String(s.clone()),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => Value::Int(i),
                    None => n.as_f64().map(Value::Float).ok_or_else(|| {
                        EvalError::InvalidDataType {
                            field: name.clone(),
                            expected: "a representable number",
                        }
                    })?,
                },
                serde_json::Value::Null
                | serde_json::Value::Array(_)
                | serde_json::Value::Object(_) => {
                    return Err(EvalError::InvalidDataType {
                        field: name.clone(),
                        expected: "a number, string or boolean",
                    })
                }
            };
            record.insert(name, value);
        }
        Ok(record)
    }

    /// Copy of this record with every present whitelisted attribute coerced
    /// to its evaluation type.
    pub(crate) fn coerced(&self) -> Result<Record, EvalError> {
        let mut record = self.clone();
        for attribute in Attribute::ALL {
            let name = attribute.as_str();
            if let Some(value) = self.data.get(name) {
                let coerced = attribute
                    .coerce(value)
                    .ok_or_else(|| EvalError::InvalidDataType {
                        field: name.to_owned(),
                        expected: attribute.expected_type(),
                    })?;
                record.data.insert(name.to_owned(), coerced);
            }
        }
        Ok(record)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
