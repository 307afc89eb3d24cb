//! Form Validation Engine
//!
//! Declarative, per-field validation for UI forms.
//!
//! This library provides:
//! - A rule library with `required`, `string`, `number` and `datetime`
//! - Message templates with host overrides
//! - Per-form error and dirty tracking
//! - Cascading re-validation of sibling fields on change
//! - Declarations loadable from TOML or JSON

pub mod config;
pub mod declarations;
pub mod form;
pub mod messages;
pub mod report;
pub mod rules;
pub mod validation;

// Re-exports for clean public API
pub use config::Config;
pub use declarations::{DeclarationError, Declarations};
pub use form::{FieldBinding, FieldValue, InputBinding};
pub use messages::MessageCatalog;
pub use rules::{RuleCondition, RuleContext, RuleLibrary, ValidationResult};
pub use validation::{EventKind, Listener, ValidateOptions, ValidationEvent, Validator};
