//! Validation Engine
//!
//! Owns the field registry and validation state of one hosting view and
//! runs declared rules whenever a field value changes. A change to one
//! field forces a single re-validation of every sibling field that has a
//! declared condition (the cascade).

use super::event::{EventKind, Listener, Listeners, ValidationEvent, isolated};
use crate::declarations::Declarations;
use crate::form::{FieldBinding, FieldRegistry, FieldValue, ValidationState};
use crate::rules::{RuleCondition, RuleContext, RuleLibrary};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Per-call options of [`Validator::validate_with`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateOptions {
    /// Evaluate rules even when the value has not changed
    pub force: bool,
    /// Fields to skip. The cascade appends the field that triggered it.
    pub ignore_field_names: Vec<String>,
}

impl ValidateOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn ignores(&self, field: &str) -> bool {
        self.ignore_field_names.iter().any(|name| name == field)
    }

    fn ignore(&mut self, field: &str) {
        if !self.ignores(field) {
            self.ignore_field_names.push(field.to_string());
        }
    }
}

pub struct Validator {
    declarations: Declarations,
    library: RuleLibrary,
    registry: FieldRegistry,
    state: ValidationState,
    listeners: Listeners,
    /// One-shot forces armed through `request_force`
    pending_force: HashSet<(String, String)>,
    /// Fields whose declared `force` has already been spent
    spent_force: HashSet<(String, String)>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("declarations", &self.declarations)
            .field("library", &self.library)
            .field("registry", &self.registry)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(Declarations::default())
    }
}

impl Validator {
    /// Engine with the built-in rule library
    pub fn new(declarations: Declarations) -> Self {
        Self::with_library(declarations, RuleLibrary::new())
    }

    pub fn with_library(declarations: Declarations, library: RuleLibrary) -> Self {
        Self {
            declarations,
            library,
            registry: FieldRegistry::new(),
            state: ValidationState::default(),
            listeners: Listeners::default(),
            pending_force: HashSet::new(),
            spent_force: HashSet::new(),
        }
    }

    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    pub fn declarations_mut(&mut self) -> &mut Declarations {
        &mut self.declarations
    }

    pub fn rules(&self) -> &RuleLibrary {
        &self.library
    }

    /// Rule library, for registering custom rules
    pub fn rules_mut(&mut self) -> &mut RuleLibrary {
        &mut self.library
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    /// Field names of a form in registration order
    pub fn field_names(&self, form: &str) -> Vec<String> {
        self.registry.field_names(form)
    }

    /// Render a message through the declared overrides and built-ins
    pub fn message(&self, key: &str, variables: &Value) -> String {
        self.declarations.messages.get(key, variables)
    }

    // Host lifecycle

    /// A bound input appeared. Registers it and emits `inserted`.
    pub fn on_field_attached<B: FieldBinding + 'static>(&mut self, form: &str, binding: B) -> bool {
        let Some(field) = self.attach(form, binding) else {
            return false;
        };
        self.emit_registration(EventKind::Inserted, form, &field);
        true
    }

    /// A bound input changed. Replaces the binding, emits `updated` and
    /// validates the field.
    pub fn on_field_value_changed<B: FieldBinding + 'static>(
        &mut self,
        form: &str,
        binding: B,
    ) -> bool {
        let Some(field) = self.attach(form, binding) else {
            return false;
        };
        self.emit_registration(EventKind::Updated, form, &field);
        self.validate(form, Some(field.as_str()));
        true
    }

    /// A bound input went away
    pub fn on_field_detached(&mut self, form: &str, field: &str) -> bool {
        if form.trim().is_empty() || field.trim().is_empty() {
            log::warn!("Cannot detach field \"{}\" of form \"{}\"", field, form);
            return false;
        }
        self.registry.unregister(form, field)
    }

    fn attach<B: FieldBinding + 'static>(&mut self, form: &str, binding: B) -> Option<String> {
        let field = binding.name();
        if field.trim().is_empty() {
            log::warn!("Field name is not specified (form \"{}\")", form);
            return None;
        }
        if form.trim().is_empty() {
            log::warn!("Form name is not specified for field \"{}\"", field);
            return None;
        }

        self.registry.register(form, &field, Box::new(binding));
        Some(field)
    }

    fn emit_registration(&self, kind: EventKind, form: &str, field: &str) {
        let value = self.current_value(form, field);
        let errors = self.errors(Some(form), Some(field));
        self.emit(ValidationEvent::new(kind, form, field, value).with_errors(errors));
    }

    // Validation

    /// Validate one field, or every registered field of `form`
    pub fn validate(&mut self, form: &str, field: Option<&str>) {
        self.validate_with(form, field, &mut ValidateOptions::default());
    }

    /// Validate with explicit options. The options are shared by the whole
    /// pass, so fields the cascade adds to `ignore_field_names` stay skipped
    /// for the rest of it.
    pub fn validate_with(
        &mut self,
        form: &str,
        field: Option<&str>,
        options: &mut ValidateOptions,
    ) {
        if form.is_empty() {
            return;
        }

        match field {
            Some(field) => self.validate_field(form, field, options, false),
            None => {
                for field in self.registry.field_names(form) {
                    self.validate_field(form, &field, options, false);
                }
            }
        }
    }

    /// Arm a one-shot force for the next validation of a field
    pub fn request_force(&mut self, form: &str, field: &str) {
        self.pending_force
            .insert((form.to_string(), field.to_string()));
    }

    fn validate_field(
        &mut self,
        form: &str,
        field: &str,
        options: &mut ValidateOptions,
        force_override: bool,
    ) {
        if options.ignores(field) {
            return;
        }

        let Some(entry) = self.registry.get_mut(form, field) else {
            log::warn!("Cannot validate unregistered field \"{}.{}\"", form, field);
            return;
        };

        let value = isolated("field value accessor", FieldValue::default(), || {
            entry.binding().value()
        });
        let previous = match entry.last_checked() {
            Some(previous) => previous.clone(),
            None => isolated("field value accessor", FieldValue::default(), || {
                entry.binding().old_value()
            }),
        };
        entry.record_checked(value.clone());

        let changed = value != previous;
        if changed {
            self.state.dirty.mark(form);
        }

        let mut force = options.force || force_override;
        let mut errors = Vec::new();

        match self.declarations.condition(form, field) {
            None => {
                self.state.errors.clear_field(form, field);
                self.emit(ValidationEvent::new(
                    EventKind::NoConditionFound,
                    form,
                    field,
                    value.clone(),
                ));
            }
            Some(cond) => {
                // A declared `force` applies to the first evaluation only
                let key = (form.to_string(), field.to_string());
                let declared = cond.force && self.spent_force.insert(key.clone());
                let requested = self.pending_force.remove(&key);
                force |= declared || requested;
                if !force && !changed {
                    return;
                }

                log::debug!("Validating {}.{} (force: {})", form, field, force);
                self.state.snapshots.record(form, field, cond.snapshot());
                self.state.errors.clear_field(form, field);

                let ctx = RuleContext {
                    form_name: form,
                    field_name: field,
                    value: &value,
                    old_value: &previous,
                    cond,
                    catalog: &self.declarations.messages,
                };
                errors = evaluate_rules(&self.library, cond, &ctx);
                if !errors.is_empty() {
                    self.state.errors.set(form, field, errors.clone());
                }
            }
        }

        if !force && changed {
            self.cascade(form, field, options);
        }

        self.emit(
            ValidationEvent::new(EventKind::Validated, form, field, value).with_errors(errors),
        );
    }

    /// Force one re-validation of every sibling that has a condition
    fn cascade(&mut self, form: &str, field: &str, options: &mut ValidateOptions) {
        for sibling in self.registry.field_names(form) {
            if sibling == field || self.declarations.condition(form, &sibling).is_none() {
                continue;
            }
            options.ignore(field);
            self.validate_field(form, &sibling, options, true);
        }
    }

    fn current_value(&self, form: &str, field: &str) -> FieldValue {
        self.registry
            .get(form, field)
            .map(|entry| {
                isolated("field value accessor", FieldValue::default(), || {
                    entry.binding().value()
                })
            })
            .unwrap_or_default()
    }

    // Events

    /// Subscribe a listener; subscribing the same listener twice is a no-op
    pub fn on(&mut self, listener: Listener) {
        self.listeners.add(listener);
    }

    pub fn off(&mut self, listener: &Listener) {
        self.listeners.remove(listener);
    }

    fn emit(&self, event: ValidationEvent) {
        self.listeners.notify_all(&event);
        if let Some(callback) = &self.declarations.on {
            super::event::notify(callback, &event);
        }
    }

    // Errors

    /// Error messages of one field, one form, or everything
    pub fn errors(&self, form: Option<&str>, field: Option<&str>) -> Vec<String> {
        let Some(form) = form else {
            return self
                .ordered_forms()
                .iter()
                .flat_map(|form| self.errors(Some(form.as_str()), None))
                .collect();
        };

        let Some(fields) = self.state.errors.form(form) else {
            return Vec::new();
        };
        match field {
            Some(field) => fields.get(field).cloned().unwrap_or_default(),
            None => self
                .ordered_fields(form)
                .iter()
                .filter_map(|field| fields.get(field))
                .flatten()
                .cloned()
                .collect(),
        }
    }

    pub fn has_errors(&self, form: Option<&str>, field: Option<&str>) -> bool {
        let Some(form) = form else {
            return self
                .ordered_forms()
                .iter()
                .any(|form| self.has_errors(Some(form.as_str()), None));
        };

        let Some(fields) = self.state.errors.form(form) else {
            return false;
        };
        match field {
            Some(field) => fields.get(field).is_some_and(|messages| !messages.is_empty()),
            None => fields.values().any(|messages| !messages.is_empty()),
        }
    }

    pub fn clear_errors(&mut self, form: Option<&str>, field: Option<&str>) {
        match (form, field) {
            (None, _) => self.state.errors.clear_all(),
            (Some(form), None) => self.state.errors.clear_form(form),
            (Some(form), Some(field)) => self.state.errors.clear_field(form, field),
        }
    }

    /// Registered forms first, then forms only the error store knows about
    fn ordered_forms(&self) -> Vec<String> {
        let mut forms = self.registry.form_names();
        for form in self.state.errors.form_names() {
            if !forms.iter().any(|known| known == form) {
                forms.push(form.to_string());
            }
        }
        forms
    }

    fn ordered_fields(&self, form: &str) -> Vec<String> {
        let mut fields = self.registry.field_names(form);
        if let Some(stored) = self.state.errors.form(form) {
            for field in stored.keys() {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }

    // Dirty tracking

    /// Whether `form`, or any registered form, has changed since the last
    /// clear. A form whose fields were all detached no longer counts.
    pub fn is_dirty(&self, form: Option<&str>) -> bool {
        match form {
            Some(form) => self.state.dirty.contains(form),
            None => self
                .registry
                .form_names()
                .iter()
                .any(|form| self.state.dirty.contains(form)),
        }
    }

    /// Mark `form`, or every registered form, as dirty
    pub fn mark_dirty(&mut self, form: Option<&str>) {
        match form {
            Some(form) => self.state.dirty.mark(form),
            None => {
                for form in self.registry.form_names() {
                    self.state.dirty.mark(&form);
                }
            }
        }
    }

    pub fn clear_dirty(&mut self, form: Option<&str>) {
        match form {
            Some(form) => self.state.dirty.clear(form),
            None => self.state.dirty.clear_all(),
        }
    }

    /// Reset dirty state, errors and condition snapshots
    pub fn clear(&mut self, form: Option<&str>) {
        self.clear_dirty(form);
        self.clear_errors(form, None);
        match form {
            Some(form) => self.state.snapshots.remove_form(form),
            None => self.state.snapshots.clear_all(),
        }
    }

    /// Serialized condition last evaluated for a field
    pub fn condition_snapshot(&self, form: &str, field: &str) -> Option<&str> {
        self.state.snapshots.get(form, field)
    }
}

/// Run every rule of a condition in order and collect the messages of the
/// failing ones. Unknown rules are skipped.
fn evaluate_rules(
    library: &RuleLibrary,
    cond: &RuleCondition,
    ctx: &RuleContext<'_>,
) -> Vec<String> {
    let mut errors = Vec::new();

    for name in &cond.rules {
        let Some(rule) = library.resolve(cond.source(name)) else {
            log::warn!(
                "Unknown rule \"{}\" on field \"{}.{}\"",
                name,
                ctx.form_name,
                ctx.field_name
            );
            continue;
        };

        let result = isolated("rule evaluator", None, || Some(rule(ctx)));
        if let Some(result) = result.filter(|r| !r.is_valid()) {
            errors.extend(result.errors);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::InputBinding;

    fn signup() -> Validator {
        Validator::new(
            Declarations::new().field("signup", "username", RuleCondition::new("required")),
        )
    }

    #[test]
    fn test_empty_form_name_is_noop() {
        let mut validator = signup();
        validator.validate("", None);
        assert!(!validator.is_dirty(None));
    }

    #[test]
    fn test_attach_requires_names() {
        let mut validator = signup();
        assert!(!validator.on_field_attached("signup", InputBinding::new("")));
        assert!(!validator.on_field_attached("", InputBinding::new("username")));
        assert!(validator.registry().form_names().is_empty());
    }

    #[test]
    fn test_change_records_errors_and_dirty() {
        let mut validator = signup();
        validator.on_field_attached("signup", InputBinding::new("username").with_value("bob"));
        validator.on_field_value_changed(
            "signup",
            InputBinding::new("username").with_value("bob").with_value("  "),
        );

        assert!(validator.is_dirty(Some("signup")));
        assert_eq!(validator.errors(Some("signup"), None), vec!["The value is empty."]);
        assert!(validator.condition_snapshot("signup", "username").is_some());
    }

    #[test]
    fn test_first_check_uses_binding_previous_value() {
        let mut validator = signup();
        // old value "" -> value "bob": a change, but a valid one
        validator.on_field_value_changed("signup", InputBinding::new("username").with_value("bob"));
        assert!(validator.is_dirty(Some("signup")));
        assert!(!validator.has_errors(None, None));
        assert_eq!(
            validator.state().errors().field("signup", "username"),
            None
        );
    }

    #[test]
    fn test_unregistered_field_is_skipped() {
        let mut validator = signup();
        validator.validate("signup", Some("username"));
        assert!(validator.errors(None, None).is_empty());
    }

    #[test]
    fn test_panicking_rule_is_skipped() {
        let cond = RuleCondition::new("boom, required").inline("boom", |_| panic!("rule failure"));
        let mut validator = Validator::new(Declarations::new().field("signup", "username", cond));
        validator.on_field_attached("signup", InputBinding::new("username"));
        validator.validate_with("signup", None, &mut ValidateOptions::forced());

        assert_eq!(validator.errors(None, None), vec!["The value is empty."]);
    }
}
