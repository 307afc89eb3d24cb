//! Field Bindings
//!
//! The engine only needs three things from a live input: its name, its
//! current value and its previous value.

use crate::declarations::unwrap_toml_datetimes;
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Value held by an input: a single text scalar or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl FieldValue {
    /// Text form of the value, `None` for lists
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    /// All scalars concatenated
    pub fn joined(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.concat(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = unwrap_toml_datetimes(serde_json::Value::deserialize(deserializer)?);
        Ok(match raw {
            serde_json::Value::Array(items) => {
                FieldValue::List(items.iter().map(scalar_text).collect())
            }
            other => FieldValue::Text(scalar_text(&other)),
        })
    }
}

/// Numbers and booleans arrive as text, the way an input element reports them
fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Accessor the host binding layer provides for each attached input
pub trait FieldBinding {
    /// Stable field name
    fn name(&self) -> String;

    /// Current value
    fn value(&self) -> FieldValue;

    /// Value before the most recent change
    fn old_value(&self) -> FieldValue;
}

/// Shared handle: the host keeps one clone and mutates it in place
impl<B: FieldBinding> FieldBinding for Rc<RefCell<B>> {
    fn name(&self) -> String {
        self.borrow().name()
    }

    fn value(&self) -> FieldValue {
        self.borrow().value()
    }

    fn old_value(&self) -> FieldValue {
        self.borrow().old_value()
    }
}

/// Plain in-memory input, used by the CLI and handy for hosts and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputBinding {
    name: String,
    value: FieldValue,
    old_value: FieldValue,
}

impl InputBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder form of `set_value`
    pub fn with_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.set_value(value);
        self
    }

    /// Replace the value, remembering the previous one
    pub fn set_value(&mut self, value: impl Into<FieldValue>) {
        self.old_value = std::mem::replace(&mut self.value, value.into());
    }
}

impl FieldBinding for InputBinding {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn value(&self) -> FieldValue {
        self.value.clone()
    }

    fn old_value(&self) -> FieldValue {
        self.old_value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_tracks_previous() {
        let mut input = InputBinding::new("email");
        input.set_value("a@example.com");
        input.set_value("b@example.com");

        assert_eq!(input.value(), FieldValue::from("b@example.com"));
        assert_eq!(input.old_value(), FieldValue::from("a@example.com"));
    }

    #[test]
    fn test_shared_binding() {
        let shared = Rc::new(RefCell::new(InputBinding::new("tags")));
        let handle = Rc::clone(&shared);
        handle.borrow_mut().set_value(vec!["a", "b"]);

        assert_eq!(shared.name(), "tags");
        assert_eq!(shared.value(), FieldValue::from(vec!["a", "b"]));
    }

    #[test]
    fn test_deserialize_values() {
        let text: FieldValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, FieldValue::from("hello"));

        let number: FieldValue = serde_json::from_str("42").unwrap();
        assert_eq!(number, FieldValue::from("42"));

        let list: FieldValue = serde_json::from_str("[\"a\", 1, true]").unwrap();
        assert_eq!(list, FieldValue::from(vec!["a", "1", "true"]));

        // Native TOML dates arrive as their literal text
        let values: std::collections::HashMap<String, FieldValue> =
            toml::from_str("birthday = 2020-01-01\nslots = [09:00:00, 1979-05-27T07:32:00Z]")
                .unwrap();
        assert_eq!(values["birthday"], FieldValue::from("2020-01-01"));
        assert_eq!(
            values["slots"],
            FieldValue::from(vec!["09:00:00", "1979-05-27T07:32:00Z"])
        );
    }

    #[test]
    fn test_joined() {
        assert_eq!(FieldValue::from(vec![" ", "x"]).joined(), " x");
        assert_eq!(FieldValue::from("abc").as_text(), Some("abc"));
        assert_eq!(FieldValue::from(vec!["abc"]).as_text(), None);
    }
}
