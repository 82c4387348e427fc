//! Validation Error Types

use thiserror::Error;

/// Errors during alert validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Missing or blank required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Optional field present but blank
    #[error("Field {0} must not be blank when present")]
    BlankField(&'static str),

    /// Field longer than allowed
    #[error("{field} is too long: {length} > {max} chars, value={preview}...(truncated)")]
    TooLong {
        field: &'static str,
        length: usize,
        max: usize,
        preview: String,
    },

    /// More alerts in one request than allowed
    #[error("Batch of {size} alerts exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
}
