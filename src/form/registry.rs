//! Field Registry
//!
//! Insertion-ordered map of form name to field name to live binding.

use super::binding::{FieldBinding, FieldValue};
use indexmap::IndexMap;
use std::fmt;

/// A registered field: the host binding plus the value seen on the last check
pub struct Field {
    binding: Box<dyn FieldBinding>,
    last_checked: Option<FieldValue>,
}

impl Field {
    pub fn binding(&self) -> &dyn FieldBinding {
        self.binding.as_ref()
    }

    /// Value recorded the last time the engine looked at this field
    pub fn last_checked(&self) -> Option<&FieldValue> {
        self.last_checked.as_ref()
    }

    pub(crate) fn record_checked(&mut self, value: FieldValue) -> Option<FieldValue> {
        self.last_checked.replace(value)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.binding.name())
            .field("last_checked", &self.last_checked)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct FieldRegistry {
    forms: IndexMap<String, IndexMap<String, Field>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the binding for a field. The form is created on first use.
    pub fn register(&mut self, form: &str, field: &str, binding: Box<dyn FieldBinding>) {
        let fields = self.forms.entry(form.to_string()).or_default();
        match fields.get_mut(field) {
            Some(existing) => existing.binding = binding,
            None => {
                fields.insert(
                    field.to_string(),
                    Field {
                        binding,
                        last_checked: None,
                    },
                );
            }
        }
    }

    /// Remove a field; drops the form once it has no fields left
    pub fn unregister(&mut self, form: &str, field: &str) -> bool {
        let Some(fields) = self.forms.get_mut(form) else {
            return false;
        };
        let removed = fields.shift_remove(field).is_some();
        if fields.is_empty() {
            self.forms.shift_remove(form);
        }
        removed
    }

    pub fn get(&self, form: &str, field: &str) -> Option<&Field> {
        self.forms.get(form)?.get(field)
    }

    pub fn get_mut(&mut self, form: &str, field: &str) -> Option<&mut Field> {
        self.forms.get_mut(form)?.get_mut(field)
    }

    pub fn contains(&self, form: &str, field: &str) -> bool {
        self.get(form, field).is_some()
    }

    /// Field names of a form in registration order
    pub fn field_names(&self, form: &str) -> Vec<String> {
        self.forms
            .get(form)
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Form names in registration order
    pub fn form_names(&self) -> Vec<String> {
        self.forms.keys().cloned().collect()
    }
}
