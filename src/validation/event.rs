//! Engine Events
//!
//! Every validation pass, missing condition and field registration is
//! announced to listeners. Listeners run inline; a panicking listener is
//! contained and logged.

use crate::form::FieldValue;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Event callback. Identity (the `Rc` allocation) is what `off` matches on.
pub type Listener = Rc<dyn Fn(&ValidationEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A field was validated but has no declared condition
    NoConditionFound,
    /// A validation pass finished for a field
    Validated,
    /// A field binding was attached
    Inserted,
    /// A field binding was replaced after a value change
    Updated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub form_name: String,
    pub field_name: String,
    pub value: FieldValue,
    pub has_errors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ValidationEvent {
    pub fn new(kind: EventKind, form_name: &str, field_name: &str, value: FieldValue) -> Self {
        Self {
            kind,
            form_name: form_name.to_string(),
            field_name: field_name.to_string(),
            value,
            has_errors: false,
            errors: None,
        }
    }

    /// Attach an error list; an empty list leaves `errors` unset
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.has_errors = !errors.is_empty();
        self.errors = if errors.is_empty() { None } else { Some(errors) };
        self
    }
}

/// Ordered listener list without duplicates
#[derive(Default, Clone)]
pub struct Listeners {
    listeners: Vec<Listener>,
}

impl Listeners {
    /// Add a listener; adding the same one twice has no effect
    pub fn add(&mut self, listener: Listener) {
        if !self.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    pub fn remove(&mut self, listener: &Listener) {
        self.listeners.retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub fn contains(&self, listener: &Listener) -> bool {
        self.listeners.iter().any(|l| Rc::ptr_eq(l, listener))
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver to every listener in order
    pub fn notify_all(&self, event: &ValidationEvent) {
        for listener in &self.listeners {
            notify(listener, event);
        }
    }
}

/// Call one listener, containing any panic
pub fn notify(listener: &Listener, event: &ValidationEvent) {
    isolated("event listener", (), || listener(event));
}

/// Run a host-supplied callback, falling back to `default` if it panics
pub(crate) fn isolated<T>(what: &str, default: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            log::warn!("Ignoring panic raised by {}", what);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn event() -> ValidationEvent {
        ValidationEvent::new(EventKind::Validated, "signup", "username", FieldValue::from("x"))
    }

    fn failing_listener(_: &ValidationEvent) {
        panic!("listener failure");
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut listeners = Listeners::default();
        let listener: Listener = Rc::new(|_: &ValidationEvent| {});
        listeners.add(Rc::clone(&listener));
        listeners.add(Rc::clone(&listener));
        assert_eq!(listeners.len(), 1);

        listeners.remove(&listener);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);

        let mut listeners = Listeners::default();
        listeners.add(Rc::new(failing_listener));
        listeners.add(Rc::new(move |_: &ValidationEvent| *counter.borrow_mut() += 1));

        listeners.notify_all(&event());
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(event()).unwrap();
        assert_eq!(json["type"], "validated");
        assert_eq!(json["formName"], "signup");
        assert_eq!(json["hasErrors"], false);
        assert!(json.get("errors").is_none());

        let failed = event().with_errors(vec!["The value is empty.".to_string()]);
        let json = serde_json::to_value(failed).unwrap();
        assert_eq!(json["hasErrors"], true);
        assert_eq!(json["errors"][0], "The value is empty.");
    }
}
