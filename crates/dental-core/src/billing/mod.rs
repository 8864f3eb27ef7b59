//! Treatment billing: standard costs and the per-treatment payment ledger.

mod ledger;
mod pricing;
mod status;

pub use ledger::*;
pub use pricing::*;
pub use status::*;

use thiserror::Error;

use crate::db::DbError;
use crate::models::ValidationError;

/// Payment ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("No payment record for treatment: {0}")]
    NotFound(String),

    #[error("Treatment not found in this clinic: {0}")]
    TreatmentNotFound(String),

    #[error("No payment record for treatment {0} and no total amount supplied")]
    MissingTotal(String),

    #[error("Payment record already exists for treatment: {0}")]
    AlreadyExists(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
