//! Forms and Fields
//!
//! Live input bindings and the per-form state the engine keeps.

pub mod binding;
pub mod registry;
pub mod state;

pub use binding::{FieldBinding, FieldValue, InputBinding};
pub use registry::{Field, FieldRegistry};
pub use state::{ConditionSnapshots, DirtySet, ErrorStore, ValidationState};
