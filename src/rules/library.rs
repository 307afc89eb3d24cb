//! Rule Library
//!
//! Name to evaluator map with the built-ins pre-registered.

use super::builtin;
use super::{Rule, RuleContext, RuleSource, ValidationResult};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub struct RuleLibrary {
    rules: HashMap<String, Rule>,
}

impl Default for RuleLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleLibrary")
            .field("rules", &self.names())
            .finish()
    }
}

impl RuleLibrary {
    /// Library with the built-in rules registered
    pub fn new() -> Self {
        let mut library = Self::empty();
        library.register("required", builtin::required);
        library.register("string", builtin::string);
        library.register("number", builtin::number);
        library.register("datetime", builtin::datetime);
        library
    }

    /// Library without any rules
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Add or replace a named rule
    pub fn register<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&RuleContext<'_>) -> ValidationResult + 'static,
    {
        log::debug!("Registering rule: {}", name);
        self.rules.insert(name.to_string(), Rc::new(rule));
    }

    pub fn get(&self, name: &str) -> Option<Rule> {
        self.rules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Turn a rule source into a callable evaluator
    pub fn resolve(&self, source: RuleSource<'_>) -> Option<Rule> {
        match source {
            RuleSource::Inline(rule) => Some(rule),
            RuleSource::Named(name) => self.get(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldValue;
    use crate::messages::MessageCatalog;
    use crate::rules::RuleCondition;

    #[test]
    fn test_builtins_registered() {
        let library = RuleLibrary::new();
        assert_eq!(
            library.names(),
            vec!["datetime", "number", "required", "string"]
        );
        assert!(RuleLibrary::empty().names().is_empty());
    }

    #[test]
    fn test_custom_rule_replaces_builtin() {
        let mut library = RuleLibrary::new();
        library.register("required", |_| ValidationResult::invalid("custom"));

        let cond = RuleCondition::new("required");
        let catalog = MessageCatalog::new();
        let value = FieldValue::from("filled");
        let ctx = RuleContext {
            form_name: "signup",
            field_name: "username",
            value: &value,
            old_value: &value,
            cond: &cond,
            catalog: &catalog,
        };

        let rule = library.resolve(cond.source("required")).unwrap();
        assert_eq!(rule(&ctx), ValidationResult::invalid("custom"));
    }

    #[test]
    fn test_unknown_rule_unresolved() {
        let library = RuleLibrary::new();
        assert!(library.resolve(RuleSource::Named("email")).is_none());
    }
}
