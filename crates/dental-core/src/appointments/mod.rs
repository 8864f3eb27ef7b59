//! Appointments and follow-ups: cached reads, invalidating writes, and the
//! completion flow.

mod cache;
mod clock;
mod follow_ups;
mod live;
mod service;

pub use cache::*;
pub use clock::*;
pub use follow_ups::*;
pub use live::*;
pub use service::*;

use thiserror::Error;

use crate::db::DbError;
use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type AppointmentResult<T> = Result<T, AppointmentError>;
