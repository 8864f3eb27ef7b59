//! Bulk operation lifecycle.
//!
//! ```text
//! Idle → Confirming → Processing → Succeeded | RolledBack
//!            │
//!            └─ cancel → Idle
//! ```
//!
//! Processing is only reachable through an explicit confirmation and cannot
//! be cancelled once entered.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{BulkError, BulkOutcome, BulkResult, ToothSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkPhase {
    Idle,
    Confirming,
    Processing,
    Succeeded,
    RolledBack,
}

impl BulkPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BulkPhase::Succeeded | BulkPhase::RolledBack)
    }
}

/// One bulk action moving through its lifecycle.
///
/// `A` is the action the user asked for, e.g. a treatment or image request.
#[derive(Debug)]
pub struct BulkOperation<A> {
    phase: BulkPhase,
    selection: ToothSelection,
    action: Option<A>,
}

impl<A> Default for BulkOperation<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> BulkOperation<A> {
    pub fn new() -> Self {
        Self {
            phase: BulkPhase::Idle,
            selection: ToothSelection::new(),
            action: None,
        }
    }

    pub fn phase(&self) -> BulkPhase {
        self.phase
    }

    pub fn selection(&self) -> &ToothSelection {
        &self.selection
    }

    fn expect_phase(&self, expected: BulkPhase, action: &'static str) -> BulkResult<()> {
        if self.phase != expected {
            return Err(BulkError::InvalidTransition {
                phase: self.phase,
                action,
            });
        }
        Ok(())
    }

    /// Ask for confirmation of `action` on `selection`.
    pub fn request(&mut self, selection: ToothSelection, action: A) -> BulkResult<()> {
        self.expect_phase(BulkPhase::Idle, "request")?;
        if selection.is_empty() {
            return Err(BulkError::EmptySelection);
        }
        self.selection = selection;
        self.action = Some(action);
        self.phase = BulkPhase::Confirming;
        Ok(())
    }

    /// Back out of the confirmation. Nothing has been written; the selection
    /// stays as it was.
    pub fn cancel(&mut self) -> BulkResult<Option<A>> {
        self.expect_phase(BulkPhase::Confirming, "cancel")?;
        self.phase = BulkPhase::Idle;
        Ok(self.action.take())
    }

    /// Acknowledge the confirmation and enter Processing.
    pub fn confirm(&mut self) -> BulkResult<()> {
        self.expect_phase(BulkPhase::Confirming, "confirm")?;
        self.phase = BulkPhase::Processing;
        info!(teeth = self.selection.len(), "bulk operation confirmed");
        Ok(())
    }

    /// Run the confirmed action and settle on a terminal phase.
    ///
    /// On success the selection is cleared. An error from `run` means nothing
    /// stayed written and ends in RolledBack as well.
    pub fn process<T, F>(&mut self, run: F) -> BulkResult<BulkOutcome<T>>
    where
        F: FnOnce(&ToothSelection, &A) -> BulkResult<BulkOutcome<T>>,
    {
        self.expect_phase(BulkPhase::Processing, "process")?;
        let action = self.action.take().ok_or(BulkError::InvalidTransition {
            phase: self.phase,
            action: "process",
        })?;

        let result = run(&self.selection, &action);
        match &result {
            Ok(outcome) if outcome.is_success() => {
                self.phase = BulkPhase::Succeeded;
                self.selection.clear();
                info!("bulk operation succeeded");
            }
            Ok(_) => {
                self.phase = BulkPhase::RolledBack;
                warn!("bulk operation rolled back");
            }
            Err(e) => {
                self.phase = BulkPhase::RolledBack;
                warn!(error = %e, "bulk operation failed before writing");
            }
        }
        result
    }

    /// Leave a terminal phase so a new operation can start.
    pub fn reset(&mut self) -> BulkResult<()> {
        if !self.phase.is_terminal() {
            return Err(BulkError::InvalidTransition {
                phase: self.phase,
                action: "reset",
            });
        }
        self.phase = BulkPhase::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::RollbackReport;
    use crate::effects::BestEffort;
    use crate::models::ToothNumber;

    fn selection(teeth: &[u8]) -> ToothSelection {
        teeth.iter().map(|n| ToothNumber::new(*n).unwrap()).collect()
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut op = BulkOperation::new();
        op.request(selection(&[1, 2]), "filling").unwrap();
        assert_eq!(op.phase(), BulkPhase::Confirming);

        assert_eq!(op.cancel().unwrap(), Some("filling"));
        assert_eq!(op.phase(), BulkPhase::Idle);
        assert_eq!(op.selection().len(), 2);
    }

    #[test]
    fn test_cannot_process_without_confirm() {
        let mut op = BulkOperation::new();
        op.request(selection(&[1]), ()).unwrap();
        let err = op
            .process(|_, _| Ok(BulkOutcome::Succeeded(BestEffort::new(()))))
            .unwrap_err();
        assert!(matches!(
            err,
            BulkError::InvalidTransition {
                phase: BulkPhase::Confirming,
                ..
            }
        ));
    }

    #[test]
    fn test_success_clears_selection() {
        let mut op = BulkOperation::new();
        op.request(selection(&[3, 4, 5]), ()).unwrap();
        op.confirm().unwrap();
        assert!(op.cancel().is_err());

        let outcome = op
            .process(|sel, _| Ok(BulkOutcome::Succeeded(BestEffort::new(sel.len()))))
            .unwrap();
        assert!(outcome.reload_required());
        assert_eq!(op.phase(), BulkPhase::Succeeded);
        assert!(op.selection().is_empty());

        op.reset().unwrap();
        assert_eq!(op.phase(), BulkPhase::Idle);
    }

    #[test]
    fn test_rollback_keeps_selection() {
        let mut op = BulkOperation::new();
        op.request(selection(&[3]), ()).unwrap();
        op.confirm().unwrap();
        let outcome: BulkOutcome<()> = op
            .process(|_, _| {
                Ok(BulkOutcome::RolledBack(RollbackReport {
                    cause: "insert failed".into(),
                    undone: 0,
                    failures: Vec::new(),
                }))
            })
            .unwrap();
        assert!(!outcome.reload_required());
        assert_eq!(op.phase(), BulkPhase::RolledBack);
        assert_eq!(op.selection().len(), 1);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let mut op: BulkOperation<()> = BulkOperation::new();
        assert!(matches!(
            op.request(ToothSelection::new(), ()),
            Err(BulkError::EmptySelection)
        ));
        assert_eq!(op.phase(), BulkPhase::Idle);
    }
}
