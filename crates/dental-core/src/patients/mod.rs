//! Patient registration with duplicate detection.
//!
//! Pipeline: form input → validation/normalization → duplicate check by
//! canonical phone → user decision → insert (or link to the existing record).

mod duplicates;
mod normalize;
mod registry;

pub use duplicates::*;
pub use normalize::*;
pub use registry::*;

use thiserror::Error;

use crate::db::DbError;
use crate::models::ValidationError;

/// Patient workflow errors.
#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Patient not found: {0}")]
    NotFound(String),
}

pub type PatientResult<T> = Result<T, PatientError>;
