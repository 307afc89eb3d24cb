//! Message Catalog
//!
//! Resolves message keys to user-facing text. Host overrides win over the
//! built-in defaults; `${name}` placeholders are filled from the variables.

use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(.*?)\}").expect("placeholder pattern is valid")
});

/// Built-in message templates
const BUILTIN_MESSAGES: &[(&str, &str)] = &[
    ("error.required", "The value is empty."),
    ("error.invalid", "The value is invalid."),
    (
        "error.string.fixedLength",
        "The length must be ${minLength} characters.",
    ),
    (
        "error.string.minLength-maxLength",
        "The length must be between ${minLength} and ${maxLength} characters.",
    ),
    (
        "error.string.minLength",
        "The length must be ${minLength} characters or more.",
    ),
    (
        "error.string.maxLength",
        "The length must be ${maxLength} characters or less.",
    ),
    ("error.number.fixed", "The value must be ${min}."),
    (
        "error.number.min-max",
        "The value must be between ${min} and ${max}.",
    ),
    ("error.number.min", "The value must be ${min} or greater."),
    ("error.number.max", "The value must be ${max} or smaller."),
    ("error.datetime.fixed", "The value must be ${min}."),
    (
        "error.datetime.min-max",
        "The value must be between ${min} and ${max}.",
    ),
    ("error.datetime.min", "The value must be ${min} or after."),
    ("error.datetime.max", "The value must be ${max} or before."),
];

/// Message lookup with host overrides layered over the built-ins
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    overrides: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with host-declared overrides
    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    /// Add or replace a single override
    pub fn set_override(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.overrides.insert(key.into(), template.into());
    }

    /// Find the template for a key, override first
    pub fn template(&self, key: &str) -> Option<&str> {
        if let Some(template) = self.overrides.get(key).filter(|t| !t.is_empty()) {
            return Some(template.as_str());
        }

        BUILTIN_MESSAGES
            .iter()
            .find(|(builtin_key, _)| *builtin_key == key)
            .map(|(_, template)| *template)
    }

    /// Render the message for `key` using `variables` (a JSON object).
    ///
    /// Unknown keys log a warning and render as an empty string.
    pub fn get(&self, key: &str, variables: &Value) -> String {
        match self.template(key) {
            Some(template) => interpolate(template, variables),
            None => {
                log::warn!("Unknown message key \"{}\"", key);
                String::new()
            }
        }
    }
}

/// Replace every `${name}` with the matching variable, or nothing
pub fn interpolate(template: &str, variables: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            variables
                .get(&caps[1])
                .map(render_variable)
                .unwrap_or_default()
        })
        .into_owned()
}

fn render_variable(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_message() {
        let catalog = MessageCatalog::new();
        assert_eq!(
            catalog.get("error.required", &json!({})),
            "The value is empty."
        );
    }

    #[test]
    fn test_override_wins() {
        let mut catalog = MessageCatalog::new();
        catalog.set_override("error.required", "Fill this in.");
        assert_eq!(catalog.get("error.required", &json!({})), "Fill this in.");
        assert_eq!(catalog.get("error.invalid", &json!({})), "The value is invalid.");
    }

    #[test]
    fn test_unknown_key_is_empty() {
        let catalog = MessageCatalog::new();
        assert_eq!(catalog.get("error.nope", &json!({})), "");
    }

    #[test]
    fn test_interpolation() {
        let vars = json!({"minLength": 3, "maxLength": 5, "label": "name"});
        assert_eq!(
            interpolate("${label}: ${minLength}-${maxLength} ${minLength}", &vars),
            "name: 3-5 3"
        );
        // Missing variables render as nothing
        assert_eq!(interpolate("[${missing}]", &vars), "[]");
        assert_eq!(interpolate("no placeholders", &Value::Null), "no placeholders");
    }
}
