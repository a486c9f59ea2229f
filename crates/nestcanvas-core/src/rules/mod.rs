//! Structural rules for untrusted snapshot JSON

pub mod invariants;
pub mod validation;

pub use validation::{validate_snapshot, validate_value, ValidationReport};
