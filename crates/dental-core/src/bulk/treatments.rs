//! Bulk treatment creation.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{require_patient, BulkError, BulkOutcome, BulkProgress, BulkResult, RollbackReport, ToothSelection};
use crate::billing::{PaymentEntry, PaymentLedger};
use crate::db::{PatientStore, PaymentStore, TreatmentStore};
use crate::effects::{BestEffort, SideEffect, SideEffectFailure};
use crate::models::{non_negative, DentalTreatment, TreatmentInput};

/// Payment figures entered once and copied to every tooth's own ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkPayment {
    pub total_amount: f64,
    /// First payment, if any was taken up front
    pub initial: Option<PaymentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkTreatmentRequest {
    pub clinic_id: String,
    pub patient_id: String,
    pub treatment: TreatmentInput,
    /// `None` when payment tracking is off
    pub payment: Option<BulkPayment>,
}

/// Create one treatment per selected tooth, then attach per-tooth payment
/// records.
///
/// Nothing is written unless the patient exists in the request's clinic.
/// Treatment inserts are all-or-nothing: when one fails, the treatments
/// already written by this batch are deleted and the outcome is RolledBack.
/// Payment records are attached afterwards; a failure there is logged and
/// reported in the result but leaves the treatments in place.
pub fn run_bulk_treatments<S, F>(
    store: &S,
    selection: &ToothSelection,
    request: &BulkTreatmentRequest,
    mut progress: F,
) -> BulkResult<BulkOutcome<Vec<DentalTreatment>>>
where
    S: PatientStore + TreatmentStore + PaymentStore,
    F: FnMut(&BulkProgress),
{
    if selection.is_empty() {
        return Err(BulkError::EmptySelection);
    }
    let teeth = selection.teeth();

    // Build every row up front so validation errors surface before any write.
    let pending: Vec<DentalTreatment> = teeth
        .iter()
        .map(|tooth| DentalTreatment::new(&request.clinic_id, &request.patient_id, *tooth, &request.treatment))
        .collect::<Result<_, _>>()?;
    if let Some(payment) = &request.payment {
        non_negative("total_amount", payment.total_amount)?;
    }
    require_patient(store, &request.clinic_id, &request.patient_id)?;

    let total = pending.len();
    let mut created: Vec<DentalTreatment> = Vec::with_capacity(total);

    for treatment in pending {
        progress(&BulkProgress::new(
            created.len(),
            total,
            format!("Creating treatment for tooth {}", treatment.tooth_number),
        ));

        if let Err(e) = store.insert_treatment(&treatment) {
            error!(
                tooth = %treatment.tooth_number,
                error = %e,
                "treatment insert failed, rolling back batch"
            );
            progress(&BulkProgress::new(created.len(), total, "Rolling back created treatments"));
            return Ok(BulkOutcome::RolledBack(undo_treatments(store, &created, e.to_string())));
        }
        created.push(treatment);
    }

    let mut result = BestEffort::new(Vec::new());
    if let Some(payment) = &request.payment {
        progress(&BulkProgress::new(total, total, "Attaching payment records"));
        let ledger = PaymentLedger::new(store);
        for treatment in &created {
            if let Err(e) = ledger.create_payment(
                &treatment.clinic_id,
                &treatment.id,
                &treatment.patient_id,
                payment.total_amount,
                payment.initial.as_ref(),
            ) {
                warn!(
                    tooth = %treatment.tooth_number,
                    treatment_id = %treatment.id,
                    error = %e,
                    "payment record not attached, treatment kept"
                );
                result.record(SideEffect::PaymentAttachment, treatment.tooth_number.code(), e);
            }
        }
    }

    progress(&BulkProgress::new(total, total, format!("Created {} treatments", total)));
    info!(
        patient_id = %request.patient_id,
        teeth = total,
        payment_failures = result.failures.len(),
        "bulk treatments created"
    );
    result.value = created;
    Ok(BulkOutcome::Succeeded(result))
}

fn undo_treatments<S: TreatmentStore>(store: &S, created: &[DentalTreatment], cause: String) -> RollbackReport {
    let mut report = RollbackReport {
        cause,
        undone: 0,
        failures: Vec::new(),
    };

    for treatment in created {
        match store.delete_treatment(&treatment.clinic_id, &treatment.id) {
            Ok(_) => report.undone += 1,
            Err(e) => {
                error!(treatment_id = %treatment.id, error = %e, "rollback delete failed");
                report.failures.push(SideEffectFailure {
                    effect: SideEffect::RollbackDelete,
                    target: treatment.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}
