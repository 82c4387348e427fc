//! Alert Validator

use crate::error::ValidationError;
use alerting::Alert;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Characters kept from an oversize value in the error message
const PREVIEW_CHARS: usize = 200;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Longest accepted error message (chars)
    pub max_message_length: usize,
    /// Longest accepted value for identifying fields (chars)
    pub max_field_length: usize,
    /// Largest accepted batch
    pub max_batch_size: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_message_length: 1000,
            max_field_length: 200,
            max_batch_size: 1000,
        }
    }
}

/// Result of validating a batch of alerts
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the batch and every alert in it are valid
    pub valid: bool,
    /// Set when the batch as a whole is rejected; alerts are then not checked
    pub batch_error: Option<ValidationError>,
    /// Position in the batch and error, for each invalid alert
    pub errors: Vec<(usize, ValidationError)>,
    /// Number of alerts validated
    pub alerts_checked: usize,
}

/// Validator for incoming alert events
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single alert, stopping at the first problem
    pub fn validate(&self, alert: &Alert) -> Result<(), ValidationError> {
        self.required("app", &alert.app)?;
        self.required("error_code", &alert.error_code)?;
        self.required("index", &alert.index)?;

        if let Some(action) = &alert.action {
            if action.trim().is_empty() {
                return Err(ValidationError::BlankField("action"));
            }
            self.max_length("action", action, self.config.max_field_length)?;
        }
        if let Some(message) = &alert.error_message {
            self.max_length("error_message", message, self.config.max_message_length)?;
        }
        Ok(())
    }

    /// Validate every alert in a batch, collecting all errors.
    ///
    /// An oversize batch is rejected as a whole before any alert is checked.
    pub fn validate_batch(&self, alerts: &[Alert]) -> ValidationResult {
        if alerts.len() > self.config.max_batch_size {
            debug!(
                "Rejected batch of {} alerts, limit {}",
                alerts.len(),
                self.config.max_batch_size
            );
            return ValidationResult {
                valid: false,
                batch_error: Some(ValidationError::BatchTooLarge {
                    size: alerts.len(),
                    max: self.config.max_batch_size,
                }),
                errors: Vec::new(),
                alerts_checked: 0,
            };
        }

        let errors: Vec<(usize, ValidationError)> = alerts
            .iter()
            .enumerate()
            .filter_map(|(i, alert)| self.validate(alert).err().map(|e| (i, e)))
            .collect();

        if !errors.is_empty() {
            debug!("Rejected {} of {} alerts", errors.len(), alerts.len());
        }

        ValidationResult {
            valid: errors.is_empty(),
            batch_error: None,
            errors,
            alerts_checked: alerts.len(),
        }
    }

    fn required(&self, field: &'static str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field));
        }
        self.max_length(field, value, self.config.max_field_length)
    }

    fn max_length(
        &self,
        field: &'static str,
        value: &str,
        max: usize,
    ) -> Result<(), ValidationError> {
        let length = value.chars().count();
        if length > max {
            Err(ValidationError::TooLong {
                field,
                length,
                max,
                preview: value.chars().take(PREVIEW_CHARS).collect(),
            })
        } else {
            Ok(())
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
