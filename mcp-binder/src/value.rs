//! Dynamically-typed argument values.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{BindError, BindResult};

/// One dynamically-typed argument value.
///
/// JSON numbers are always represented as `f64`; integer fields are narrowed
/// during binding after an integrality check.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// Explicit `null`. Treated as an absent key by the extractors.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// String value.
    String(String),
    /// Ordered list of values.
    List(Vec<ArgValue>),
    /// Nested object.
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Returns the name of the dynamic type, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "array",
            Self::Map(_) => "object",
        }
    }

    /// Returns `true` for [`ArgValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            Value::String(text) => Self::String(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Untyped parameters of a single call, keyed by argument name.
///
/// Created fresh for every call and discarded once binding finishes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgumentBag {
    entries: BTreeMap<String, ArgValue>,
}

impl ArgumentBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag from the JSON `arguments` of a call.
    ///
    /// `null` yields an empty bag.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::NotAnObject`] for any other non-object value.
    pub fn from_json(value: Value) -> BindResult<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(entries) => Ok(Self {
                entries: entries
                    .into_iter()
                    .map(|(key, value)| (key, ArgValue::from(value)))
                    .collect(),
            }),
            other => Err(BindError::NotAnObject {
                found: ArgValue::from(other).kind(),
            }),
        }
    }

    /// Inserts a value, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Adds a value and returns the updated bag.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for the key, treating `null` as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.entries.get(key).filter(|value| !value.is_null())
    }

    /// Returns the number of keys, including keys bound to `null`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the bag has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_json_object() {
        let bag = ArgumentBag::from_json(json!({
            "id": 7,
            "name": "printer",
            "tags": [1, "two"],
            "nested": { "flag": true },
            "gone": null
        }))
        .unwrap();

        assert_eq!(bag.len(), 5);
        assert_eq!(bag.get("id"), Some(&ArgValue::Number(7.0)));
        assert_eq!(bag.get("name"), Some(&ArgValue::from("printer")));
        assert_eq!(
            bag.get("tags"),
            Some(&ArgValue::List(vec![
                ArgValue::Number(1.0),
                ArgValue::from("two")
            ]))
        );
        assert!(matches!(bag.get("nested"), Some(ArgValue::Map(map)) if map.len() == 1));
        assert_eq!(bag.get("gone"), None);
    }

    #[test]
    fn null_arguments_yield_empty_bag() {
        let bag = ArgumentBag::from_json(Value::Null).unwrap();
        assert!(bag.is_empty());
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = ArgumentBag::from_json(json!([1, 2])).expect_err("array is not a bag");
        assert_eq!(err, BindError::NotAnObject { found: "array" });
    }
}
