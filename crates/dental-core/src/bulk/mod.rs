//! Multi-tooth operations: one user action applied to a set of teeth.
//!
//! Two policies apply when a step fails partway:
//! - treatment rows are all-or-nothing, while per-tooth payment records are
//!   attached best-effort and never undo the treatments;
//! - image rows are all-or-nothing, and the shared blob is removed
//!   best-effort when the batch is undone.

mod images;
mod operation;
mod selection;
mod treatments;

pub use images::*;
pub use operation::*;
pub use selection::*;
pub use treatments::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{DbError, PatientStore};
use crate::effects::{BestEffort, SideEffectFailure};
use crate::media::MediaError;
use crate::models::ValidationError;

#[derive(Error, Debug)]
pub enum BulkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Patient not found in this clinic: {0}")]
    PatientNotFound(String),

    #[error("No teeth selected")]
    EmptySelection,

    #[error("Cannot {action} while {phase:?}")]
    InvalidTransition {
        phase: BulkPhase,
        action: &'static str,
    },
}

pub type BulkResult<T> = Result<T, BulkError>;

/// The batch's patient must exist in the batch's clinic.
fn require_patient<S: PatientStore>(store: &S, clinic_id: &str, patient_id: &str) -> BulkResult<()> {
    match store.get_patient(clinic_id, patient_id)? {
        Some(_) => Ok(()),
        None => Err(BulkError::PatientNotFound(patient_id.to_string())),
    }
}

/// Informational progress of a running batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkProgress {
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

impl BulkProgress {
    pub(crate) fn new(completed: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            completed,
            total,
            message: message.into(),
        }
    }
}

/// What was undone after a failed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
    /// The failure that triggered the rollback
    pub cause: String,
    /// Rows deleted again
    pub undone: usize,
    /// Compensating steps that did not go through
    pub failures: Vec<SideEffectFailure>,
}

/// Terminal result of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BulkOutcome<T> {
    Succeeded(BestEffort<T>),
    RolledBack(RollbackReport),
}

impl<T> BulkOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, BulkOutcome::Succeeded(_))
    }

    /// After a successful batch the caller re-fetches the whole chart.
    pub fn reload_required(&self) -> bool {
        self.is_success()
    }

    pub fn succeeded(&self) -> Option<&BestEffort<T>> {
        match self {
            BulkOutcome::Succeeded(result) => Some(result),
            BulkOutcome::RolledBack(_) => None,
        }
    }
}
