//! Validation Engine
//!
//! The orchestrator tying declarations, rules, field bindings and state
//! together, plus the events it emits.

pub mod engine;
pub mod event;

pub use engine::{ValidateOptions, Validator};
pub use event::{EventKind, Listener, Listeners, ValidationEvent};

// Re-export common types
pub use crate::rules::ValidationResult;
