//! Narrow, clinic-scoped accessor traits consumed by the orchestration layers.
//!
//! Every read and delete takes the clinic id explicitly; inserts and updates
//! use the `clinic_id` carried by the record itself.

use super::DbResult;
use crate::models::{
    Appointment, DentalTreatment, FollowUp, Patient, PaymentTransaction, ToothCondition,
    ToothImage, ToothNumber, TreatmentPayment,
};

pub trait PatientStore {
    fn insert_patient(&self, patient: &Patient) -> DbResult<()>;
    fn update_patient(&self, patient: &Patient) -> DbResult<bool>;
    fn get_patient(&self, clinic_id: &str, id: &str) -> DbResult<Option<Patient>>;
    /// Exact match on the canonical phone, active patients only.
    fn find_patients_by_phone(&self, clinic_id: &str, phone: &str) -> DbResult<Vec<Patient>>;
    /// Case-insensitive name prefix match.
    fn search_patients(&self, clinic_id: &str, query: &str, limit: usize) -> DbResult<Vec<Patient>>;
    fn list_patients(&self, clinic_id: &str, include_inactive: bool) -> DbResult<Vec<Patient>>;
    /// Soft delete: clears `is_active`.
    fn deactivate_patient(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
    /// Hard delete, cascading to the patient's chart and ledger rows.
    fn delete_patient(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
}

pub trait TreatmentStore {
    fn insert_treatment(&self, treatment: &DentalTreatment) -> DbResult<()>;
    fn update_treatment(&self, treatment: &DentalTreatment) -> DbResult<bool>;
    fn get_treatment(&self, clinic_id: &str, id: &str) -> DbResult<Option<DentalTreatment>>;
    fn list_treatments_for_patient(
        &self,
        clinic_id: &str,
        patient_id: &str,
    ) -> DbResult<Vec<DentalTreatment>>;
    fn delete_treatment(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
}

pub trait ConditionStore {
    fn get_condition(
        &self,
        clinic_id: &str,
        patient_id: &str,
        tooth: ToothNumber,
    ) -> DbResult<Option<ToothCondition>>;
    fn list_conditions_for_patient(
        &self,
        clinic_id: &str,
        patient_id: &str,
    ) -> DbResult<Vec<ToothCondition>>;
    fn insert_condition(&self, condition: &ToothCondition) -> DbResult<()>;
    fn update_condition(&self, condition: &ToothCondition) -> DbResult<bool>;
    fn delete_condition(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
}

pub trait ImageStore {
    fn insert_image(&self, image: &ToothImage) -> DbResult<()>;
    fn list_images(
        &self,
        clinic_id: &str,
        patient_id: &str,
        tooth: ToothNumber,
    ) -> DbResult<Vec<ToothImage>>;
    fn list_images_for_patient(&self, clinic_id: &str, patient_id: &str) -> DbResult<Vec<ToothImage>>;
    fn delete_image(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
    /// Number of rows still referencing a remote blob.
    fn count_images_for_storage_id(&self, clinic_id: &str, storage_id: &str) -> DbResult<usize>;
}

pub trait PaymentStore {
    fn get_payment_for_treatment(
        &self,
        clinic_id: &str,
        treatment_id: &str,
    ) -> DbResult<Option<TreatmentPayment>>;
    fn list_payments_for_patient(
        &self,
        clinic_id: &str,
        patient_id: &str,
    ) -> DbResult<Vec<TreatmentPayment>>;
    fn insert_payment(&self, payment: &TreatmentPayment) -> DbResult<()>;
    fn update_payment(&self, payment: &TreatmentPayment) -> DbResult<bool>;
    fn delete_payment(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
    fn insert_transaction(&self, transaction: &PaymentTransaction) -> DbResult<()>;
    /// Transactions of one header, oldest first.
    fn list_transactions(&self, clinic_id: &str, payment_id: &str) -> DbResult<Vec<PaymentTransaction>>;
}

pub trait AppointmentStore {
    fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()>;
    fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool>;
    fn get_appointment(&self, clinic_id: &str, id: &str) -> DbResult<Option<Appointment>>;
    /// All appointments of the clinic, or only those on `date`, ordered by date and time.
    fn list_appointments(&self, clinic_id: &str, date: Option<&str>) -> DbResult<Vec<Appointment>>;
    fn delete_appointment(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
}

pub trait FollowUpStore {
    fn insert_follow_up(&self, follow_up: &FollowUp) -> DbResult<()>;
    /// Ordered by due date.
    fn list_follow_ups(&self, clinic_id: &str, patient_id: Option<&str>) -> DbResult<Vec<FollowUp>>;
    fn delete_follow_up(&self, clinic_id: &str, id: &str) -> DbResult<bool>;
}

/// Everything the tooth chart reads.
pub trait ChartStore: TreatmentStore + ConditionStore + ImageStore {}

impl<T: TreatmentStore + ConditionStore + ImageStore> ChartStore for T {}
