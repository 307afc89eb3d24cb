//! Validation State Store
//!
//! Error lists per form and field, the dirty form set and the condition
//! snapshot cache. Mutation is crate-private; the engine is the only writer.

use indexmap::{IndexMap, IndexSet};

/// form -> field -> messages. Absent field: never validated.
/// Empty list: validated clean.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ErrorStore {
    forms: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl ErrorStore {
    pub fn form(&self, form: &str) -> Option<&IndexMap<String, Vec<String>>> {
        self.forms.get(form)
    }

    pub fn field(&self, form: &str, field: &str) -> Option<&[String]> {
        self.forms.get(form)?.get(field).map(Vec::as_slice)
    }

    pub fn form_names(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub(crate) fn set(&mut self, form: &str, field: &str, messages: Vec<String>) {
        self.forms
            .entry(form.to_string())
            .or_default()
            .insert(field.to_string(), messages);
    }

    /// Empty an existing entry in place; never creates one
    pub(crate) fn clear_field(&mut self, form: &str, field: &str) {
        if let Some(messages) = self.forms.get_mut(form).and_then(|f| f.get_mut(field)) {
            messages.clear();
        }
    }

    /// Reset a form to "nothing recorded"
    pub(crate) fn clear_form(&mut self, form: &str) {
        if let Some(fields) = self.forms.get_mut(form) {
            fields.clear();
        }
    }

    pub(crate) fn clear_all(&mut self) {
        self.forms.clear();
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DirtySet {
    forms: IndexSet<String>,
}

impl DirtySet {
    pub fn contains(&self, form: &str) -> bool {
        self.forms.contains(form)
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.forms.iter().map(String::as_str)
    }

    pub(crate) fn mark(&mut self, form: &str) {
        if !self.forms.contains(form) {
            self.forms.insert(form.to_string());
        }
    }

    pub(crate) fn clear(&mut self, form: &str) {
        self.forms.shift_remove(form);
    }

    pub(crate) fn clear_all(&mut self) {
        self.forms.clear();
    }
}

/// Serialized condition last evaluated per form and field
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConditionSnapshots {
    forms: IndexMap<String, IndexMap<String, String>>,
}

impl ConditionSnapshots {
    pub fn get(&self, form: &str, field: &str) -> Option<&str> {
        self.forms.get(form)?.get(field).map(String::as_str)
    }

    pub(crate) fn record(&mut self, form: &str, field: &str, snapshot: String) {
        self.forms
            .entry(form.to_string())
            .or_default()
            .insert(field.to_string(), snapshot);
    }

    pub(crate) fn remove_form(&mut self, form: &str) {
        self.forms.shift_remove(form);
    }

    pub(crate) fn clear_all(&mut self) {
        self.forms.clear();
    }
}

/// Everything the engine remembers between passes
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationState {
    pub(crate) errors: ErrorStore,
    pub(crate) dirty: DirtySet,
    pub(crate) snapshots: ConditionSnapshots,
}

impl ValidationState {
    pub fn errors(&self) -> &ErrorStore {
        &self.errors
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn snapshots(&self) -> &ConditionSnapshots {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_field_keeps_entry() {
        let mut store = ErrorStore::default();
        store.set("signup", "username", vec!["too short".to_string()]);
        store.clear_field("signup", "username");

        assert_eq!(store.field("signup", "username"), Some(&[][..]));
        // Clearing an unknown field does not create it
        store.clear_field("signup", "email");
        assert_eq!(store.field("signup", "email"), None);
    }

    #[test]
    fn test_clear_form() {
        let mut store = ErrorStore::default();
        store.set("signup", "username", vec!["too short".to_string()]);
        store.set("login", "password", vec!["empty".to_string()]);
        store.clear_form("signup");

        assert!(store.form("signup").unwrap().is_empty());
        assert!(store.field("login", "password").is_some());
    }

    #[test]
    fn test_dirty_set() {
        let mut dirty = DirtySet::default();
        dirty.mark("signup");
        dirty.mark("signup");
        dirty.mark("login");

        assert_eq!(dirty.iter().collect::<Vec<_>>(), vec!["signup", "login"]);
        dirty.clear("signup");
        assert!(!dirty.contains("signup"));
        dirty.clear_all();
        assert!(dirty.is_empty());
    }
}
