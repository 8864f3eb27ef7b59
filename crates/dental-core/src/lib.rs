//! Dental Clinic Core Library
//!
//! Clinic-scoped patient, tooth chart, billing and appointment logic for a
//! multi-tenant dental practice app.
//!
//! # Architecture
//!
//! ```text
//!   Patient form ──► normalize ──► duplicate check ──► decision ──► insert / link
//!
//!   Tooth chart (32 slots) ◄── conditions + treatments (eager)
//!          │                 ◄── images (per tooth, on demand)
//!          ▼
//!   Bulk action ─ Idle → Confirming → Processing → Succeeded | RolledBack
//!          │
//!          ├── treatments: all-or-nothing, payments attached best-effort
//!          └── images: one upload, all-or-nothing rows, blob cleanup best-effort
//!
//!   Payment ledger: header per treatment + append-only transactions
//!   Appointments: 5 min cache, invalidated by every write
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite storage behind narrow clinic-scoped store traits
//! - [`models`]: Domain types (Patient, DentalTreatment, TreatmentPayment, etc.)
//! - [`patients`]: Phone normalization, duplicate detection, registration
//! - [`chart`]: Tooth chart assembly and condition upsert
//! - [`billing`]: Standard costs and the payment ledger
//! - [`bulk`]: Multi-tooth operations
//! - [`appointments`]: Appointment cache, live updates and follow-ups
//! - [`media`], [`messaging`]: Traits for the remote storage and messaging collaborators

pub mod appointments;
pub mod billing;
pub mod bulk;
pub mod chart;
pub mod db;
pub mod effects;
pub mod media;
pub mod messaging;
pub mod models;
pub mod patients;

// Re-export commonly used types
pub use appointments::{AppointmentCache, AppointmentService, Clock, SystemClock};
pub use billing::{classify_payment_status, PaymentLedger, TreatmentCatalog};
pub use bulk::{BulkOperation, BulkOutcome, BulkPhase, ToothSelection};
pub use chart::ToothChart;
pub use db::Database;
pub use effects::{BestEffort, SideEffect, SideEffectFailure};
pub use models::{
    Appointment, DentalTreatment, NewPatient, Patient, PaymentStatus, PaymentSummary,
    ToothCondition, ToothImage, ToothNumber, TreatmentPayment,
};
pub use patients::{DuplicateDetector, PatientRegistry};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use billing::PaymentEntry;
use bulk::{BulkPayment, BulkTreatmentRequest};
use db::PatientStore;
use models::{ConditionInput, Severity, TreatmentInput, TreatmentStatus};
use patients::{DuplicateMatch, Registration, Resolution};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DentalError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl From<db::DbError> for DentalError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => DentalError::NotFound(what),
            other => DentalError::DatabaseError(other.to_string()),
        }
    }
}

impl From<models::ValidationError> for DentalError {
    fn from(e: models::ValidationError) -> Self {
        DentalError::InvalidInput(e.to_string())
    }
}

impl From<patients::PatientError> for DentalError {
    fn from(e: patients::PatientError) -> Self {
        match e {
            patients::PatientError::Validation(v) => v.into(),
            patients::PatientError::Database(d) => d.into(),
            patients::PatientError::NotFound(id) => DentalError::NotFound(id),
        }
    }
}

impl From<billing::LedgerError> for DentalError {
    fn from(e: billing::LedgerError) -> Self {
        match e {
            billing::LedgerError::Validation(v) => v.into(),
            billing::LedgerError::Database(d) => d.into(),
            billing::LedgerError::NotFound(id) | billing::LedgerError::TreatmentNotFound(id) => {
                DentalError::NotFound(id)
            }
            other => DentalError::OperationFailed(other.to_string()),
        }
    }
}

impl From<chart::ChartError> for DentalError {
    fn from(e: chart::ChartError) -> Self {
        match e {
            chart::ChartError::Validation(v) => v.into(),
            chart::ChartError::Database(d) => d.into(),
        }
    }
}

impl From<bulk::BulkError> for DentalError {
    fn from(e: bulk::BulkError) -> Self {
        match e {
            bulk::BulkError::Validation(v) => v.into(),
            bulk::BulkError::Database(d) => d.into(),
            bulk::BulkError::Media(m) => m.into(),
            bulk::BulkError::PatientNotFound(id) => DentalError::NotFound(id),
            other => DentalError::OperationFailed(other.to_string()),
        }
    }
}

impl From<appointments::AppointmentError> for DentalError {
    fn from(e: appointments::AppointmentError) -> Self {
        match e {
            appointments::AppointmentError::Validation(v) => v.into(),
            appointments::AppointmentError::Database(d) => d.into(),
            appointments::AppointmentError::NotFound(id) => DentalError::NotFound(id),
        }
    }
}

impl From<media::MediaError> for DentalError {
    fn from(e: media::MediaError) -> Self {
        DentalError::StorageError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DentalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DentalError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DentalCore>, DentalError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(DentalCore::new(db)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DentalCore>, DentalError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(DentalCore::new(db)))
}

/// Standard cost for a treatment type, if it is in the price list.
#[uniffi::export]
pub fn standard_treatment_cost(treatment_type: String) -> Option<f64> {
    TreatmentCatalog::standard().standard_cost(&treatment_type)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DentalCore {
    db: Arc<Mutex<Database>>,
    appointments: AppointmentCache,
}

impl DentalCore {
    fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            appointments: AppointmentCache::new(Arc::new(SystemClock)),
        }
    }
}

#[uniffi::export]
impl DentalCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Existing patients sharing the candidate's phone, best match first.
    pub fn check_duplicates(
        &self,
        clinic_id: String,
        name: String,
        phone: String,
    ) -> Result<Vec<FfiDuplicateMatch>, DentalError> {
        let db = self.db.lock()?;
        let check = DuplicateDetector::new(&*db).check(&clinic_id, &name, &phone)?;
        Ok(check.matches.into_iter().map(|m| m.into()).collect())
    }

    /// Register a patient.
    ///
    /// With neither `existing_patient_id` nor `force_create`, a duplicate
    /// signal stops the flow and is returned for the user to decide.
    pub fn register_patient(
        &self,
        clinic_id: String,
        patient: FfiNewPatient,
        existing_patient_id: Option<String>,
        force_create: bool,
    ) -> Result<FfiRegistration, DentalError> {
        let db = self.db.lock()?;
        let resolution = match (existing_patient_id, force_create) {
            (Some(id), _) => Resolution::UseExisting(id),
            (None, true) => Resolution::CreateAnyway,
            (None, false) => Resolution::CheckFirst,
        };
        let registration = PatientRegistry::new(&*db).register(&clinic_id, patient.try_into()?, resolution)?;
        Ok(registration.into())
    }

    pub fn get_patient(&self, clinic_id: String, patient_id: String) -> Result<Option<FfiPatient>, DentalError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(&clinic_id, &patient_id)?.map(|p| p.into()))
    }

    pub fn search_patients(
        &self,
        clinic_id: String,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, DentalError> {
        let db = self.db.lock()?;
        let patients = PatientRegistry::new(&*db).search(&clinic_id, &query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Tooth Chart Operations
    // =========================================================================

    /// All 32 teeth with conditions and treatments. Images are not included.
    pub fn load_tooth_chart(
        &self,
        clinic_id: String,
        patient_id: String,
    ) -> Result<Vec<FfiToothSlot>, DentalError> {
        let db = self.db.lock()?;
        let chart = ToothChart::load(&*db, &clinic_id, &patient_id)?;
        Ok(chart.slots().iter().map(FfiToothSlot::from).collect())
    }

    /// Set the current condition of one tooth, replacing any previous one.
    #[allow(clippy::too_many_arguments)]
    pub fn record_tooth_condition(
        &self,
        clinic_id: String,
        patient_id: String,
        tooth_number: String,
        condition_type: String,
        severity: String,
        description: Option<String>,
        notes: Option<String>,
    ) -> Result<(), DentalError> {
        let tooth: ToothNumber = tooth_number.parse()?;
        let input = ConditionInput {
            condition_type,
            description,
            severity: severity.parse::<Severity>()?,
            notes,
        };
        let db = self.db.lock()?;
        chart::upsert_condition(&*db, &clinic_id, &patient_id, tooth, &input)?;
        Ok(())
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    pub fn payment_summary(
        &self,
        clinic_id: String,
        treatment_id: String,
    ) -> Result<Option<FfiPaymentSummary>, DentalError> {
        let db = self.db.lock()?;
        let summary = PaymentLedger::new(&*db).summary(&clinic_id, &treatment_id)?;
        Ok(summary.map(|s| s.into()))
    }

    /// Record a payment. `total_if_new` is required for a treatment's first payment.
    #[allow(clippy::too_many_arguments)]
    pub fn record_payment(
        &self,
        clinic_id: String,
        treatment_id: String,
        patient_id: String,
        total_if_new: Option<f64>,
        amount: f64,
        payment_date: String,
        notes: Option<String>,
    ) -> Result<FfiPaymentSummary, DentalError> {
        let db = self.db.lock()?;
        let entry = PaymentEntry {
            amount,
            payment_date,
            notes,
        };
        let summary =
            PaymentLedger::new(&*db).record_payment(&clinic_id, &treatment_id, &patient_id, total_if_new, &entry)?;
        Ok(summary.into())
    }

    pub fn update_treatment_payment_amount(
        &self,
        clinic_id: String,
        treatment_id: String,
        total_amount: f64,
        paid_amount: f64,
    ) -> Result<FfiPaymentSummary, DentalError> {
        let db = self.db.lock()?;
        let ledger = PaymentLedger::new(&*db);
        ledger.update_treatment_payment_amount(&clinic_id, &treatment_id, total_amount, paid_amount)?;
        ledger
            .summary(&clinic_id, &treatment_id)?
            .map(|s| s.into())
            .ok_or(DentalError::NotFound(treatment_id))
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Create the same treatment on several teeth.
    ///
    /// The caller has already shown and accepted the confirmation dialog.
    pub fn create_bulk_treatments(
        &self,
        request: FfiBulkTreatmentRequest,
    ) -> Result<FfiBulkResult, DentalError> {
        let selection: ToothSelection = request
            .tooth_numbers
            .iter()
            .map(|t| t.parse::<ToothNumber>())
            .collect::<Result<_, _>>()?;
        let action = BulkTreatmentRequest::try_from(request)?;

        let mut operation = BulkOperation::new();
        operation.request(selection, action)?;
        operation.confirm()?;

        let db = self.db.lock()?;
        let outcome = operation.process(|selection, action| {
            bulk::run_bulk_treatments(&*db, selection, action, |progress| {
                tracing::debug!(
                    completed = progress.completed,
                    total = progress.total,
                    message = %progress.message,
                    "bulk progress"
                );
            })
        })?;
        Ok(outcome.into())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Appointments of a clinic, optionally for one date. Cached for 5 minutes.
    pub fn list_appointments(
        &self,
        clinic_id: String,
        date: Option<String>,
        force_refresh: bool,
    ) -> Result<Vec<FfiAppointment>, DentalError> {
        let db = self.db.lock()?;
        let service = AppointmentService::new(&*db, &self.appointments, clinic_id);
        let appointments = match date {
            Some(date) => service.load_appointments_for_date(&date, force_refresh)?,
            None => service.load_appointments(force_refresh)?,
        };
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    pub fn create_appointment(
        &self,
        clinic_id: String,
        patient_id: String,
        appointment_date: String,
        appointment_time: String,
        appointment_type: String,
        notes: Option<String>,
    ) -> Result<FfiAppointment, DentalError> {
        let mut appointment =
            Appointment::new(&clinic_id, &patient_id, &appointment_date, &appointment_time, &appointment_type)?;
        appointment.notes = notes;
        let db = self.db.lock()?;
        AppointmentService::new(&*db, &self.appointments, clinic_id).create_appointment(&appointment)?;
        Ok(appointment.into())
    }

    pub fn delete_appointment(&self, clinic_id: String, appointment_id: String) -> Result<(), DentalError> {
        let db = self.db.lock()?;
        AppointmentService::new(&*db, &self.appointments, clinic_id).delete_appointment(&appointment_id)?;
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient form input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub notes: Option<String>,
}

impl TryFrom<FfiNewPatient> for NewPatient {
    type Error = models::ValidationError;

    fn try_from(p: FfiNewPatient) -> Result<Self, Self::Error> {
        Ok(NewPatient {
            name: p.name,
            phone: p.phone,
            email: p.email,
            date_of_birth: p.date_of_birth,
            gender: p.gender.map(|g| g.parse()).transpose()?,
            address: p.address,
            allergies: p.allergies,
            current_medications: p.current_medications,
            notes: p.notes,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub clinic_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub is_active: bool,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            clinic_id: p.clinic_id,
            name: p.name,
            phone: p.phone,
            email: p.email,
            date_of_birth: p.date_of_birth,
            gender: p.gender.map(|g| g.as_str().to_string()),
            allergies: p.allergies,
            current_medications: p.current_medications,
            is_active: p.is_active,
        }
    }
}

/// FFI-safe duplicate candidate.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDuplicateMatch {
    pub patient: FfiPatient,
    pub similarity: f64,
    /// "both", "name" or "phone"
    pub match_type: String,
}

impl From<DuplicateMatch> for FfiDuplicateMatch {
    fn from(m: DuplicateMatch) -> Self {
        let match_type = match m.match_type {
            patients::MatchType::Both => "both",
            patients::MatchType::Name => "name",
            patients::MatchType::Phone => "phone",
        };
        Self {
            patient: m.patient.into(),
            similarity: m.similarity,
            match_type: match_type.to_string(),
        }
    }
}

/// FFI-safe registration outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegistration {
    /// "created", "linked" or "needs_decision"
    pub outcome: String,
    pub patient: Option<FfiPatient>,
    pub matches: Vec<FfiDuplicateMatch>,
}

impl From<Registration> for FfiRegistration {
    fn from(r: Registration) -> Self {
        match r {
            Registration::Created(p) => Self {
                outcome: "created".to_string(),
                patient: Some(p.into()),
                matches: Vec::new(),
            },
            Registration::Linked(p) => Self {
                outcome: "linked".to_string(),
                patient: Some(p.into()),
                matches: Vec::new(),
            },
            Registration::NeedsDecision(check) => Self {
                outcome: "needs_decision".to_string(),
                patient: None,
                matches: check.matches.into_iter().map(|m| m.into()).collect(),
            },
        }
    }
}

/// FFI-safe treatment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub id: String,
    pub tooth_number: String,
    pub treatment_type: String,
    pub description: Option<String>,
    pub status: String,
    pub treatment_date: String,
    pub notes: Option<String>,
}

impl From<&DentalTreatment> for FfiTreatment {
    fn from(t: &DentalTreatment) -> Self {
        Self {
            id: t.id.clone(),
            tooth_number: t.tooth_number.code(),
            treatment_type: t.treatment_type.clone(),
            description: t.description.clone(),
            status: t.status.as_str().to_string(),
            treatment_date: t.treatment_date.clone(),
            notes: t.notes.clone(),
        }
    }
}

/// FFI-safe chart slot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiToothSlot {
    pub tooth_number: String,
    pub position: String,
    pub name: String,
    pub condition_type: Option<String>,
    pub condition_severity: Option<String>,
    pub treatments: Vec<FfiTreatment>,
}

impl From<&chart::ToothSlot> for FfiToothSlot {
    fn from(slot: &chart::ToothSlot) -> Self {
        Self {
            tooth_number: slot.tooth.code(),
            position: slot.position.label().to_string(),
            name: slot.name.clone(),
            condition_type: slot.condition.as_ref().map(|c| c.condition_type.clone()),
            condition_severity: slot.condition.as_ref().map(|c| c.severity.as_str().to_string()),
            treatments: slot.treatments.iter().map(FfiTreatment::from).collect(),
        }
    }
}

/// FFI-safe payment summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPaymentSummary {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub remaining_amount: f64,
    pub payment_status: String,
    pub transaction_count: u32,
}

impl From<PaymentSummary> for FfiPaymentSummary {
    fn from(s: PaymentSummary) -> Self {
        Self {
            total_amount: s.total_amount,
            paid_amount: s.paid_amount,
            remaining_amount: s.remaining_amount,
            payment_status: s.payment_status.as_str().to_string(),
            transaction_count: s.transaction_count as u32,
        }
    }
}

/// FFI-safe bulk treatment request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBulkTreatmentRequest {
    pub clinic_id: String,
    pub patient_id: String,
    pub tooth_numbers: Vec<String>,
    pub treatment_type: String,
    pub description: Option<String>,
    pub status: String,
    pub treatment_date: String,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    /// Set to track payments; one ledger per tooth
    pub total_amount: Option<f64>,
    pub initial_paid: Option<f64>,
}

impl TryFrom<FfiBulkTreatmentRequest> for BulkTreatmentRequest {
    type Error = models::ValidationError;

    fn try_from(r: FfiBulkTreatmentRequest) -> Result<Self, Self::Error> {
        let mut treatment = TreatmentInput::new(r.treatment_type, r.treatment_date.clone());
        treatment.description = r.description;
        treatment.status = r.status.parse::<TreatmentStatus>()?;
        treatment.notes = r.notes;
        treatment.created_by = r.created_by;

        let payment = r.total_amount.map(|total_amount| BulkPayment {
            total_amount,
            initial: r
                .initial_paid
                .filter(|paid| *paid > 0.0)
                .map(|paid| PaymentEntry::new(paid, r.treatment_date.clone())),
        });

        Ok(BulkTreatmentRequest {
            clinic_id: r.clinic_id,
            patient_id: r.patient_id,
            treatment,
            payment,
        })
    }
}

/// FFI-safe bulk result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBulkResult {
    pub succeeded: bool,
    pub treatment_ids: Vec<String>,
    /// Side effects that did not go through, as "effect target: reason"
    pub failures: Vec<String>,
    pub rollback_cause: Option<String>,
    pub reload_required: bool,
}

impl From<BulkOutcome<Vec<DentalTreatment>>> for FfiBulkResult {
    fn from(outcome: BulkOutcome<Vec<DentalTreatment>>) -> Self {
        let reload_required = outcome.reload_required();
        let describe = |f: &SideEffectFailure| format!("{} {}: {}", f.effect.as_str(), f.target, f.reason);
        match outcome {
            BulkOutcome::Succeeded(result) => Self {
                succeeded: true,
                treatment_ids: result.value.iter().map(|t| t.id.clone()).collect(),
                failures: result.failures.iter().map(describe).collect(),
                rollback_cause: None,
                reload_required,
            },
            BulkOutcome::RolledBack(report) => Self {
                succeeded: false,
                treatment_ids: Vec::new(),
                failures: report.failures.iter().map(describe).collect(),
                rollback_cause: Some(report.cause),
                reload_required,
            },
        }
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub duration_minutes: u32,
    pub appointment_type: String,
    pub status: String,
    pub notes: Option<String>,
}

impl From<Appointment> for FfiAppointment {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            patient_id: a.patient_id,
            appointment_date: a.appointment_date,
            appointment_time: a.appointment_time,
            duration_minutes: a.duration_minutes,
            appointment_type: a.appointment_type,
            status: a.status.as_str().to_string(),
            notes: a.notes,
        }
    }
}
