//! Tooth chart: 32 fixed slots with conditions, treatments and lazily
//! loaded images.

mod conditions;
mod tooth_chart;

pub use conditions::*;
pub use tooth_chart::*;

use thiserror::Error;

use crate::db::DbError;
use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type ChartResult<T> = Result<T, ChartError>;
