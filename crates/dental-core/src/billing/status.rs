//! Payment status classification.

use crate::models::PaymentStatus;

/// Derive the payment status from amounts.
///
/// - nothing paid → `Pending`
/// - paid below total → `Partial`
/// - paid reaching or exceeding total → `Completed`
///
/// `Overdue` is never produced here; no time-based rule exists.
pub fn classify_payment_status(total_amount: f64, paid_amount: f64) -> PaymentStatus {
    if paid_amount <= 0.0 {
        PaymentStatus::Pending
    } else if paid_amount < total_amount {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Completed
    }
}
