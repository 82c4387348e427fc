//! Alert Input Validation
//!
//! Checks alert events collected from the logging pipeline before they are
//! handed to the alert engine, which assumes well-formed input.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
