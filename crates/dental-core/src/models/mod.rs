//! Domain models for the dental clinic core.

mod appointment;
mod dental;
mod patient;
mod payment;

pub use appointment::*;
pub use dental::*;
pub use patient::*;
pub use payment::*;

use thiserror::Error;

/// Field validation errors, raised before anything reaches the store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invalid tooth number: {0}")]
    InvalidToothNumber(String),

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: &'static str, value: f64 },

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Current timestamp in the format stored alongside every record.
pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trim a required text field, rejecting empty input.
pub(crate) fn required(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank input to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
