//! Rule Conditions
//!
//! The declarative per-field description of which rules apply and with
//! which options. Matches the shape of a declaration file entry:
//!
//! ```toml
//! [forms.signup.username]
//! rules = "required, string"
//! string = { minLength = 3, maxLength = 16 }
//! ```

use super::{Rule, RuleContext, ValidationResult};
use crate::declarations::unwrap_toml_datetimes;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Where the evaluator for a rule name comes from
pub enum RuleSource<'a> {
    /// Looked up by name in the rule library
    Named(&'a str),
    /// Supplied directly by the condition
    Inline(Rule),
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Rule names in evaluation order
    #[serde(default, deserialize_with = "deserialize_rule_names")]
    pub rules: Vec<String>,

    /// Trim text values before evaluation
    #[serde(default = "default_trim")]
    pub trim: bool,

    /// Evaluate on the first pass even if the value has not changed.
    /// Read once by the engine when it is constructed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,

    /// Per-rule option objects, keyed by rule name
    #[serde(flatten, deserialize_with = "deserialize_options")]
    pub options: IndexMap<String, Value>,

    #[serde(skip)]
    inline: IndexMap<String, Rule>,
}

fn default_trim() -> bool {
    true
}

impl Default for RuleCondition {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            trim: true,
            force: false,
            options: IndexMap::new(),
            inline: IndexMap::new(),
        }
    }
}

impl fmt::Debug for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleCondition")
            .field("rules", &self.rules)
            .field("trim", &self.trim)
            .field("force", &self.force)
            .field("options", &self.options)
            .field("inline", &self.inline.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleCondition {
    /// Condition from a comma-separated rule list, e.g. `"required, string"`
    pub fn new(rules: &str) -> Self {
        Self {
            rules: split_rule_names(rules),
            ..Self::default()
        }
    }

    /// Condition from an explicit rule list
    pub fn with_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|r| r.as_ref().trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            ..Self::default()
        }
    }

    /// Attach an option object for a rule
    pub fn option(mut self, rule: impl Into<String>, options: Value) -> Self {
        self.options.insert(rule.into(), options);
        self
    }

    /// Attach an inline evaluator for a rule name. It takes precedence over
    /// any rule of the same name in the library.
    pub fn inline<F>(mut self, rule: impl Into<String>, evaluator: F) -> Self
    where
        F: Fn(&RuleContext<'_>) -> ValidationResult + 'static,
    {
        self.inline.insert(rule.into(), Rc::new(evaluator));
        self
    }

    /// Keep surrounding whitespace
    pub fn untrimmed(mut self) -> Self {
        self.trim = false;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Options declared for a rule, `Null` when absent
    pub fn options_for(&self, rule: &str) -> &Value {
        self.options.get(rule).unwrap_or(&Value::Null)
    }

    pub fn source<'a>(&self, rule: &'a str) -> RuleSource<'a> {
        match self.inline.get(rule) {
            Some(evaluator) => RuleSource::Inline(Rc::clone(evaluator)),
            None => RuleSource::Named(rule),
        }
    }

    /// JSON form used for the condition snapshot cache
    pub fn snapshot(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn split_rule_names(rules: &str) -> Vec<String> {
    rules
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accept `"a, b"` or `["a", "b"]`; blank and non-string entries are dropped
fn deserialize_rule_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) => split_rule_names(&s),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
        other => {
            log::warn!("Ignoring unparseable rule list: {}", other);
            Vec::new()
        }
    })
}

/// Per-rule options with TOML dates turned into plain text
fn deserialize_options<'de, D>(deserializer: D) -> Result<IndexMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(rule, options)| (rule, unwrap_toml_datetimes(options)))
        .collect())
}
