//! Host Declarations
//!
//! The configuration a host supplies to the engine: the rule condition of
//! every field (`forms[form][field]`), message overrides and an optional
//! callback that receives every engine event. Declarations can be built in
//! code or loaded from a TOML or JSON document.

use crate::form::FieldValue;
use crate::messages::MessageCatalog;
use crate::rules::RuleCondition;
use crate::validation::Listener;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Field values per form, as read from a values document
pub type FormValues = IndexMap<String, IndexMap<String, FieldValue>>;

#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file type: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Clone, Default, Deserialize)]
pub struct Declarations {
    /// form -> field -> condition
    #[serde(default)]
    pub forms: IndexMap<String, IndexMap<String, RuleCondition>>,

    /// Message template overrides
    #[serde(default)]
    pub messages: MessageCatalog,

    /// Host callback receiving the same events as registered listeners
    #[serde(skip)]
    pub on: Option<Listener>,
}

impl fmt::Debug for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declarations")
            .field("forms", &self.forms)
            .field("messages", &self.messages)
            .field("on", &self.on.is_some())
            .finish()
    }
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: declare the condition of one field
    pub fn field(mut self, form: &str, field: &str, condition: RuleCondition) -> Self {
        self.set_condition(form, field, condition);
        self
    }

    /// Builder: override one message template
    pub fn message(mut self, key: &str, template: &str) -> Self {
        self.messages.set_override(key, template);
        self
    }

    /// Builder: install the host callback
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&crate::validation::ValidationEvent) + 'static,
    {
        self.on = Some(Rc::new(callback));
        self
    }

    pub fn set_condition(&mut self, form: &str, field: &str, condition: RuleCondition) {
        self.forms
            .entry(form.to_string())
            .or_default()
            .insert(field.to_string(), condition);
    }

    /// Drop the condition of a field; the field then validates as "no condition"
    pub fn remove_condition(&mut self, form: &str, field: &str) -> Option<RuleCondition> {
        self.forms.get_mut(form)?.shift_remove(field)
    }

    pub fn condition(&self, form: &str, field: &str) -> Option<&RuleCondition> {
        self.forms.get(form)?.get(field)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DeclarationError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, DeclarationError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load declarations from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self, DeclarationError> {
        read_document(path)
    }
}

/// Load a `form -> field -> value` document from a `.toml` or `.json` file
pub fn load_values(path: &Path) -> Result<FormValues, DeclarationError> {
    read_document(path)
}

/// Key under which the `toml` crate hands a native date or time to a
/// self-describing value
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// Replace TOML date/time wrappers, at any depth, with their text
pub(crate) fn unwrap_toml_datetimes(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.len() == 1
                && let Some(Value::String(text)) = map.get(TOML_DATETIME_KEY)
            {
                return Value::String(text.clone());
            }
            Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, unwrap_toml_datetimes(value)))
                    .collect(),
            )
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(unwrap_toml_datetimes).collect())
        }
        other => other,
    }
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, DeclarationError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(extension.as_deref(), Some("toml") | Some("json")) {
        return Err(DeclarationError::UnsupportedFormat(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| DeclarationError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Parsing {}", path.display());
    match extension.as_deref() {
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Ok(toml::from_str(&content)?),
    }
}
