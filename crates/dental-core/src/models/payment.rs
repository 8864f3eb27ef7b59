//! Treatment payment ledger models.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{new_id, now_timestamp, optional_text, required, ValidationError, ValidationResult};
use crate::billing::classify_payment_status;

/// Payment state of a treatment ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Partial,
    Completed,
    /// Accepted when read back from storage; never derived by the ledger.
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Overdue => "overdue",
        }
    }

    pub fn is_settled(self) -> bool {
        self == PaymentStatus::Completed
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "partial" => Ok(PaymentStatus::Partial),
            "completed" => Ok(PaymentStatus::Completed),
            "overdue" => Ok(PaymentStatus::Overdue),
            other => Err(ValidationError::UnknownVariant {
                kind: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

/// Ledger header: at most one per treatment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentPayment {
    pub id: String,
    pub clinic_id: String,
    pub treatment_id: String,
    pub patient_id: String,
    pub total_amount: f64,
    /// Stored copy of the transaction sum
    pub paid_amount: f64,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl TreatmentPayment {
    /// New header with nothing paid yet.
    pub fn new(
        clinic_id: &str,
        treatment_id: &str,
        patient_id: &str,
        total_amount: f64,
    ) -> ValidationResult<Self> {
        let total_amount = non_negative("total_amount", total_amount)?;
        let now = now_timestamp();
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            treatment_id: required("treatment_id", treatment_id)?,
            patient_id: required("patient_id", patient_id)?,
            total_amount,
            paid_amount: 0.0,
            payment_status: classify_payment_status(total_amount, 0.0),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub fn remaining_amount(&self) -> f64 {
        self.total_amount - self.paid_amount
    }
}

/// One payment event against a ledger header. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentTransaction {
    pub id: String,
    pub clinic_id: String,
    pub payment_id: String,
    pub amount: f64,
    /// Payment date (YYYY-MM-DD)
    pub payment_date: String,
    pub notes: Option<String>,
    pub created_at: String,
}

impl PaymentTransaction {
    pub fn new(
        clinic_id: &str,
        payment_id: &str,
        amount: f64,
        payment_date: &str,
        notes: Option<String>,
    ) -> ValidationResult<Self> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::InvalidAmount {
                field: "amount",
                value: amount,
            });
        }
        Ok(Self {
            id: new_id(),
            clinic_id: required("clinic_id", clinic_id)?,
            payment_id: required("payment_id", payment_id)?,
            amount,
            payment_date: required("payment_date", payment_date)?,
            notes: optional_text(notes),
            created_at: now_timestamp(),
        })
    }
}

/// Aggregated view of one treatment's ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PaymentSummary {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub remaining_amount: f64,
    pub payment_status: PaymentStatus,
    pub transaction_count: usize,
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> ValidationResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_header_is_pending() {
        let header = TreatmentPayment::new("clinic-1", "treatment-1", "patient-1", 1000.0).unwrap();
        assert_eq!(header.paid_amount, 0.0);
        assert_eq!(header.payment_status, PaymentStatus::Pending);
        assert_eq!(header.remaining_amount(), 1000.0);
    }

    #[test]
    fn test_negative_total_rejected() {
        assert!(TreatmentPayment::new("clinic-1", "treatment-1", "patient-1", -1.0).is_err());
    }

    #[test]
    fn test_transaction_amount_must_be_positive() {
        assert!(PaymentTransaction::new("clinic-1", "pay-1", 0.0, "2024-01-01", None).is_err());
        assert!(PaymentTransaction::new("clinic-1", "pay-1", f64::NAN, "2024-01-01", None).is_err());
        assert!(PaymentTransaction::new("clinic-1", "pay-1", 10.0, "2024-01-01", None).is_ok());
    }

    #[test]
    fn test_status_parse_accepts_overdue() {
        assert_eq!("Overdue".parse::<PaymentStatus>().unwrap(), PaymentStatus::Overdue);
        assert_eq!(PaymentStatus::Partial.as_str(), "partial");
    }
}
