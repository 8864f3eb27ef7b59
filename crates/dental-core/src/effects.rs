//! Results of operations with attached best-effort side effects.
//!
//! The primary effect either succeeds or returns an error. Side effects such
//! as a notification or a blob cleanup may fail on their own; those failures
//! are collected here and never turned into an error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Per-tooth payment record after bulk treatment creation
    PaymentAttachment,
    /// Removal of an uploaded blob no row references any more
    BlobDelete,
    /// Compensating delete of a row written earlier in the same batch
    RollbackDelete,
    /// Outbound patient message
    Notification,
}

impl SideEffect {
    pub fn as_str(self) -> &'static str {
        match self {
            SideEffect::PaymentAttachment => "payment_attachment",
            SideEffect::BlobDelete => "blob_delete",
            SideEffect::RollbackDelete => "rollback_delete",
            SideEffect::Notification => "notification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectFailure {
    pub effect: SideEffect,
    /// What the effect was about, e.g. a tooth code or a storage id
    pub target: String,
    pub reason: String,
}

/// A primary result plus the side effects that did not go through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestEffort<T> {
    pub value: T,
    pub failures: Vec<SideEffectFailure>,
}

impl<T> BestEffort<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, effect: SideEffect, target: impl Into<String>, reason: impl ToString) {
        self.failures.push(SideEffectFailure {
            effect,
            target: target.into(),
            reason: reason.to_string(),
        });
    }

    /// True when every side effect went through.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures_of(&self, effect: SideEffect) -> impl Iterator<Item = &SideEffectFailure> {
        self.failures.iter().filter(move |f| f.effect == effect)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BestEffort<U> {
        BestEffort {
            value: f(self.value),
            failures: self.failures,
        }
    }
}
