//! Payment ledger aggregation and recording.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{classify_payment_status, LedgerError, LedgerResult};
use crate::db::{PaymentStore, TreatmentStore};
use crate::models::{
    non_negative, PaymentSummary, PaymentTransaction, TreatmentPayment, ValidationError,
};

/// A payment to append to a treatment's ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentEntry {
    pub amount: f64,
    /// Payment date (YYYY-MM-DD)
    pub payment_date: String,
    pub notes: Option<String>,
}

impl PaymentEntry {
    pub fn new(amount: f64, payment_date: impl Into<String>) -> Self {
        Self {
            amount,
            payment_date: payment_date.into(),
            notes: None,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ValidationError::InvalidAmount {
                field: "amount",
                value: self.amount,
            });
        }
        if self.payment_date.trim().is_empty() {
            return Err(ValidationError::Required("payment_date"));
        }
        Ok(())
    }
}

/// Totals across all of a patient's treatment ledgers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientBalance {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub remaining_amount: f64,
    /// Ledgers not yet fully paid
    pub open_ledgers: usize,
}

/// Reads and writes treatment payment ledgers for one store.
///
/// The header's `paid_amount` is the running paid total. Recorded payments
/// add to it and the cost editor overwrites it; transactions are the history
/// behind it.
pub struct PaymentLedger<'a, S: PaymentStore + TreatmentStore> {
    store: &'a S,
}

impl<'a, S: PaymentStore + TreatmentStore> PaymentLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Summarize a treatment's ledger, or `None` when it has no header.
    ///
    /// Read-only.
    pub fn summary(&self, clinic_id: &str, treatment_id: &str) -> LedgerResult<Option<PaymentSummary>> {
        match self.store.get_payment_for_treatment(clinic_id, treatment_id)? {
            Some(header) => Ok(Some(self.summarize(&header)?)),
            None => Ok(None),
        }
    }

    fn summarize(&self, header: &TreatmentPayment) -> LedgerResult<PaymentSummary> {
        let transactions = self.store.list_transactions(&header.clinic_id, &header.id)?;
        Ok(PaymentSummary {
            total_amount: header.total_amount,
            paid_amount: header.paid_amount,
            remaining_amount: header.remaining_amount(),
            payment_status: classify_payment_status(header.total_amount, header.paid_amount),
            transaction_count: transactions.len(),
        })
    }

    /// Append a payment to a treatment's ledger.
    ///
    /// When the treatment has no header yet, one is created with
    /// `total_if_new` first. If the append then fails, that header is deleted
    /// again so no empty ledger is left behind.
    pub fn record_payment(
        &self,
        clinic_id: &str,
        treatment_id: &str,
        patient_id: &str,
        total_if_new: Option<f64>,
        entry: &PaymentEntry,
    ) -> LedgerResult<PaymentSummary> {
        entry.validate()?;
        self.require_treatment(clinic_id, treatment_id, patient_id)?;

        let (header, created) = match self.store.get_payment_for_treatment(clinic_id, treatment_id)? {
            Some(header) => (header, false),
            None => {
                let total = total_if_new.ok_or_else(|| LedgerError::MissingTotal(treatment_id.to_string()))?;
                let header = TreatmentPayment::new(clinic_id, treatment_id, patient_id, total)?;
                self.store.insert_payment(&header)?;
                (header, true)
            }
        };

        self.append(header, created, entry)
    }

    /// Create a ledger header, plus a first transaction when `initial` is given.
    ///
    /// Same all-or-nothing rule as [`record_payment`](Self::record_payment).
    pub fn create_payment(
        &self,
        clinic_id: &str,
        treatment_id: &str,
        patient_id: &str,
        total_amount: f64,
        initial: Option<&PaymentEntry>,
    ) -> LedgerResult<PaymentSummary> {
        if let Some(entry) = initial {
            entry.validate()?;
        }
        self.require_treatment(clinic_id, treatment_id, patient_id)?;
        if self.store.get_payment_for_treatment(clinic_id, treatment_id)?.is_some() {
            return Err(LedgerError::AlreadyExists(treatment_id.to_string()));
        }

        let header = TreatmentPayment::new(clinic_id, treatment_id, patient_id, total_amount)?;
        self.store.insert_payment(&header)?;

        match initial {
            Some(entry) => self.append(header, true, entry),
            None => self.summarize(&header),
        }
    }

    fn append(
        &self,
        mut header: TreatmentPayment,
        created: bool,
        entry: &PaymentEntry,
    ) -> LedgerResult<PaymentSummary> {
        let inserted = PaymentTransaction::new(
            &header.clinic_id,
            &header.id,
            entry.amount,
            &entry.payment_date,
            entry.notes.clone(),
        )
        .map_err(LedgerError::from)
        .and_then(|tx| self.store.insert_transaction(&tx).map_err(LedgerError::from));

        if let Err(e) = inserted {
            if created {
                self.discard_header(&header);
            }
            return Err(e);
        }

        header.paid_amount += entry.amount;
        header.payment_status = classify_payment_status(header.total_amount, header.paid_amount);
        self.store.update_payment(&header)?;
        let summary = self.summarize(&header)?;

        info!(
            clinic_id = %header.clinic_id,
            treatment_id = %header.treatment_id,
            amount = entry.amount,
            status = summary.payment_status.as_str(),
            "payment recorded"
        );
        Ok(summary)
    }

    /// The treatment must exist in this clinic and belong to `patient_id`.
    fn require_treatment(&self, clinic_id: &str, treatment_id: &str, patient_id: &str) -> LedgerResult<()> {
        match self.store.get_treatment(clinic_id, treatment_id)? {
            Some(treatment) if treatment.patient_id == patient_id => Ok(()),
            _ => Err(LedgerError::TreatmentNotFound(treatment_id.to_string())),
        }
    }

    /// Compensating delete for a header whose first append failed.
    fn discard_header(&self, header: &TreatmentPayment) {
        match self.store.delete_payment(&header.clinic_id, &header.id) {
            Ok(_) => warn!(
                treatment_id = %header.treatment_id,
                "first payment failed, new ledger header removed"
            ),
            Err(e) => error!(
                treatment_id = %header.treatment_id,
                payment_id = %header.id,
                error = %e,
                "failed to remove ledger header after failed first payment"
            ),
        }
    }

    /// Overwrite total and paid amounts from the cost editor.
    ///
    /// The status is always re-derived from the amounts.
    pub fn update_treatment_payment_amount(
        &self,
        clinic_id: &str,
        treatment_id: &str,
        total_amount: f64,
        paid_amount: f64,
    ) -> LedgerResult<TreatmentPayment> {
        let total_amount = non_negative("total_amount", total_amount)?;
        let paid_amount = non_negative("paid_amount", paid_amount)?;

        let mut header = self
            .store
            .get_payment_for_treatment(clinic_id, treatment_id)?
            .ok_or_else(|| LedgerError::NotFound(treatment_id.to_string()))?;

        header.total_amount = total_amount;
        header.paid_amount = paid_amount;
        header.payment_status = classify_payment_status(total_amount, paid_amount);
        self.store.update_payment(&header)?;
        Ok(header)
    }

    /// Transaction deletion has no defined semantics yet.
    pub fn delete_transaction(&self, _clinic_id: &str, transaction_id: &str) -> LedgerResult<()> {
        Err(LedgerError::Unsupported(format!(
            "deleting payment transaction {}",
            transaction_id
        )))
    }

    /// Transactions of a treatment's ledger, oldest first.
    pub fn transactions(&self, clinic_id: &str, treatment_id: &str) -> LedgerResult<Vec<PaymentTransaction>> {
        match self.store.get_payment_for_treatment(clinic_id, treatment_id)? {
            Some(header) => Ok(self.store.list_transactions(clinic_id, &header.id)?),
            None => Ok(Vec::new()),
        }
    }

    /// Sum all ledgers of one patient.
    pub fn patient_balance(&self, clinic_id: &str, patient_id: &str) -> LedgerResult<PatientBalance> {
        let mut balance = PatientBalance::default();
        for header in self.store.list_payments_for_patient(clinic_id, patient_id)? {
            let summary = self.summarize(&header)?;
            balance.total_amount += summary.total_amount;
            balance.paid_amount += summary.paid_amount;
            balance.remaining_amount += summary.remaining_amount;
            if !summary.payment_status.is_settled() {
                balance.open_ledgers += 1;
            }
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_patient, setup_db};
    use crate::db::{Database, TreatmentStore};
    use crate::models::{DentalTreatment, PaymentStatus, ToothNumber, TreatmentInput};

    fn seed_treatment(db: &Database, patient_id: &str, tooth: u8) -> DentalTreatment {
        let input = TreatmentInput::new("Filling", "2024-02-01");
        let treatment =
            DentalTreatment::new("clinic-1", patient_id, ToothNumber::new(tooth).unwrap(), &input)
                .unwrap();
        db.insert_treatment(&treatment).unwrap();
        treatment
    }

    #[test]
    fn test_partial_then_complete() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id, 3);
        let ledger = PaymentLedger::new(&db);

        let summary = ledger
            .record_payment("clinic-1", &treatment.id, &patient.id, Some(1000.0), &PaymentEntry::new(400.0, "2024-02-01"))
            .unwrap();
        assert_eq!(summary.paid_amount, 400.0);
        assert_eq!(summary.remaining_amount, 600.0);
        assert_eq!(summary.payment_status, PaymentStatus::Partial);

        let summary = ledger
            .record_payment("clinic-1", &treatment.id, &patient.id, None, &PaymentEntry::new(600.0, "2024-02-10"))
            .unwrap();
        assert_eq!(summary.paid_amount, 1000.0);
        assert_eq!(summary.remaining_amount, 0.0);
        assert_eq!(summary.payment_status, PaymentStatus::Completed);
        assert_eq!(summary.transaction_count, 2);

        let stored = db.get_payment_for_treatment("clinic-1", &treatment.id).unwrap().unwrap();
        assert_eq!(stored.paid_amount, 1000.0);
        assert_eq!(stored.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id, 3);
        let ledger = PaymentLedger::new(&db);
        ledger
            .record_payment("clinic-1", &treatment.id, &patient.id, Some(500.0), &PaymentEntry::new(100.0, "2024-02-01"))
            .unwrap();

        let first = ledger.summary("clinic-1", &treatment.id).unwrap();
        let second = ledger.summary("clinic-1", &treatment.id).unwrap();
        assert_eq!(first, second);
        assert!(ledger.summary("clinic-1", "missing").unwrap().is_none());
    }

    #[test]
    fn test_first_payment_needs_total() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id, 3);
        let ledger = PaymentLedger::new(&db);

        let err = ledger
            .record_payment("clinic-1", &treatment.id, &patient.id, None, &PaymentEntry::new(100.0, "2024-02-01"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingTotal(_)));
    }

    #[test]
    fn test_invalid_amount_writes_nothing() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id, 3);
        let ledger = PaymentLedger::new(&db);

        let err = ledger
            .record_payment("clinic-1", &treatment.id, &patient.id, Some(100.0), &PaymentEntry::new(-5.0, "2024-02-01"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(db.get_payment_for_treatment("clinic-1", &treatment.id).unwrap().is_none());
    }

    #[test]
    fn test_update_amount_rederives_status() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id, 3);
        let ledger = PaymentLedger::new(&db);
        ledger
            .create_payment("clinic-1", &treatment.id, &patient.id, 1000.0, None)
            .unwrap();

        let header = ledger
            .update_treatment_payment_amount("clinic-1", &treatment.id, 1500.0, 1500.0)
            .unwrap();
        assert_eq!(header.payment_status, PaymentStatus::Completed);

        let header = ledger
            .update_treatment_payment_amount("clinic-1", &treatment.id, 2000.0, 1500.0)
            .unwrap();
        assert_eq!(header.payment_status, PaymentStatus::Partial);

        // Header-only ledger reports the stored paid amount
        let summary = ledger.summary("clinic-1", &treatment.id).unwrap().unwrap();
        assert_eq!(summary.paid_amount, 1500.0);
        assert_eq!(summary.transaction_count, 0);
    }

    #[test]
    fn test_create_payment_twice_rejected() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id, 3);
        let ledger = PaymentLedger::new(&db);

        ledger.create_payment("clinic-1", &treatment.id, &patient.id, 100.0, None).unwrap();
        assert!(matches!(
            ledger.create_payment("clinic-1", &treatment.id, &patient.id, 100.0, None),
            Err(LedgerError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_delete_transaction_unsupported() {
        let db = setup_db();
        let ledger = PaymentLedger::new(&db);
        assert!(matches!(
            ledger.delete_transaction("clinic-1", "tx-1"),
            Err(LedgerError::Unsupported(_))
        ));
    }

    #[test]
    fn test_patient_balance() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let a = seed_treatment(&db, &patient.id, 3);
        let b = seed_treatment(&db, &patient.id, 4);
        let ledger = PaymentLedger::new(&db);

        ledger
            .create_payment("clinic-1", &a.id, &patient.id, 1000.0, Some(&PaymentEntry::new(1000.0, "2024-02-01")))
            .unwrap();
        ledger
            .create_payment("clinic-1", &b.id, &patient.id, 500.0, Some(&PaymentEntry::new(200.0, "2024-02-01")))
            .unwrap();

        let balance = ledger.patient_balance("clinic-1", &patient.id).unwrap();
        assert_eq!(balance.total_amount, 1500.0);
        assert_eq!(balance.paid_amount, 1200.0);
        assert_eq!(balance.remaining_amount, 300.0);
        assert_eq!(balance.open_ledgers, 1);
    }
}
