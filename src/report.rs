//! Batch Check
//!
//! Drives a [`Validator`] over a whole values document the way a host
//! would on submit: attach every field, then force one pass per form.

use crate::declarations::{Declarations, FormValues};
use crate::form::InputBinding;
use crate::validation::{ValidateOptions, Validator};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub valid: bool,
    /// form -> field -> messages, failing fields only
    pub forms: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.forms
            .values()
            .flat_map(|fields| fields.values())
            .map(Vec::len)
            .sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return writeln!(f, "All fields valid");
        }
        for (form, fields) in &self.forms {
            for (field, messages) in fields {
                for message in messages {
                    writeln!(f, "{}.{}: {}", form, field, message)?;
                }
            }
        }
        writeln!(f, "{} error(s)", self.error_count())
    }
}

/// Validate every field of `values` against `declarations`
pub fn check(declarations: Declarations, values: &FormValues) -> Report {
    let mut validator = Validator::new(declarations);

    for (form, fields) in values {
        for (field, value) in fields {
            validator.on_field_attached(form, InputBinding::new(field).with_value(value.clone()));
        }
    }

    let mut report = Report::default();
    for form in values.keys() {
        validator.validate_with(form, None, &mut ValidateOptions::forced());

        for field in validator.field_names(form) {
            let messages = validator.errors(Some(form.as_str()), Some(field.as_str()));
            if !messages.is_empty() {
                report
                    .forms
                    .entry(form.clone())
                    .or_default()
                    .insert(field, messages);
            }
        }
    }

    report.valid = !validator.has_errors(None, None);
    report
}
