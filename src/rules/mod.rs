//! Rule Library
//!
//! Rules are pure functions from a [`RuleContext`] to a [`ValidationResult`].
//! Four rules are built in (`required`, `string`, `number`, `datetime`);
//! hosts add their own by name or inline on a condition.

pub mod builtin;
pub mod condition;
pub mod library;

pub use condition::{RuleCondition, RuleSource};
pub use library::RuleLibrary;

use crate::form::FieldValue;
use crate::messages::MessageCatalog;
use serde::Serialize;
use serde_json::Value;
use std::rc::Rc;

/// A rule evaluator
pub type Rule = Rc<dyn Fn(&RuleContext<'_>) -> ValidationResult>;

/// Outcome of evaluating one rule, or all rules of a field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![message.into()],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Everything a rule may look at
pub struct RuleContext<'a> {
    pub form_name: &'a str,
    pub field_name: &'a str,
    pub value: &'a FieldValue,
    pub old_value: &'a FieldValue,
    pub cond: &'a RuleCondition,
    pub catalog: &'a MessageCatalog,
}

impl RuleContext<'_> {
    /// Render a catalog message
    pub fn message(&self, key: &str, variables: &Value) -> String {
        self.catalog.get(key, variables)
    }

    /// Option object declared for `rule` on this field
    pub fn options(&self, rule: &str) -> &Value {
        self.cond.options_for(rule)
    }
}
