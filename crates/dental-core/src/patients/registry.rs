//! Patient create/edit/delete flows.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{normalize_phone, title_case, validate_email, DuplicateCheck, DuplicateDetector};
use super::{PatientError, PatientResult};
use crate::db::PatientStore;
use crate::models::{NewPatient, Patient, ValidationError};

/// How the user resolved (or pre-empted) a duplicate signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Run the duplicate check; stop and ask if anything matches
    CheckFirst,
    /// Attach the new activity to this existing patient
    UseExisting(String),
    /// Create a new record despite the signal (e.g. family sharing a phone)
    CreateAnyway,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Registration {
    Created(Patient),
    Linked(Patient),
    /// Matches found; nothing was written
    NeedsDecision(DuplicateCheck),
}

impl Registration {
    /// The patient the caller should continue with, if the flow finished.
    pub fn patient(&self) -> Option<&Patient> {
        match self {
            Registration::Created(p) | Registration::Linked(p) => Some(p),
            Registration::NeedsDecision(_) => None,
        }
    }
}

/// Clinic-scoped patient registry.
pub struct PatientRegistry<'a, S: PatientStore> {
    store: &'a S,
}

impl<'a, S: PatientStore> PatientRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Register a new patient according to `resolution`.
    ///
    /// Validation runs before any store call.
    pub fn register(
        &self,
        clinic_id: &str,
        input: NewPatient,
        resolution: Resolution,
    ) -> PatientResult<Registration> {
        match resolution {
            Resolution::UseExisting(patient_id) => {
                let existing = self
                    .store
                    .get_patient(clinic_id, &patient_id)?
                    .ok_or(PatientError::NotFound(patient_id))?;
                Ok(Registration::Linked(existing))
            }
            Resolution::CheckFirst => {
                let patient = Patient::from_input(clinic_id, input)?;
                let check = DuplicateDetector::new(self.store).check(
                    clinic_id,
                    &patient.name,
                    &patient.phone,
                )?;
                if !check.is_empty() {
                    info!(
                        clinic_id,
                        matches = check.matches.len(),
                        "possible duplicate patient, awaiting decision"
                    );
                    return Ok(Registration::NeedsDecision(check));
                }
                self.store.insert_patient(&patient)?;
                Ok(Registration::Created(patient))
            }
            Resolution::CreateAnyway => {
                let patient = Patient::from_input(clinic_id, input)?;
                self.store.insert_patient(&patient)?;
                info!(clinic_id, patient_id = %patient.id, "patient created despite duplicate signal");
                Ok(Registration::Created(patient))
            }
        }
    }

    /// Save an edited patient, re-applying name/phone/email normalization.
    pub fn update(&self, mut patient: Patient) -> PatientResult<Patient> {
        patient.name = title_case(&patient.name);
        if patient.name.is_empty() {
            return Err(ValidationError::Required("name").into());
        }
        patient.phone = normalize_phone(&patient.phone)
            .ok_or_else(|| ValidationError::InvalidPhone(patient.phone.clone()))?;
        if let Some(email) = &patient.email {
            validate_email(email)?;
        }

        if !self.store.update_patient(&patient)? {
            return Err(PatientError::NotFound(patient.id));
        }
        Ok(patient)
    }

    /// Soft delete.
    pub fn deactivate(&self, clinic_id: &str, patient_id: &str) -> PatientResult<()> {
        if !self.store.deactivate_patient(clinic_id, patient_id)? {
            return Err(PatientError::NotFound(patient_id.to_string()));
        }
        Ok(())
    }

    /// Hard delete (admin action). Removes the patient's chart and ledger too.
    pub fn delete(&self, clinic_id: &str, patient_id: &str) -> PatientResult<()> {
        if !self.store.delete_patient(clinic_id, patient_id)? {
            return Err(PatientError::NotFound(patient_id.to_string()));
        }
        info!(clinic_id, patient_id, "patient hard-deleted");
        Ok(())
    }

    pub fn search(&self, clinic_id: &str, query: &str, limit: usize) -> PatientResult<Vec<Patient>> {
        Ok(self.store.search_patients(clinic_id, query, limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_db;
    use crate::patients::MatchType;

    #[test]
    fn test_new_phone_creates_directly() {
        let db = setup_db();
        let registry = PatientRegistry::new(&db);

        let result = registry
            .register("clinic-1", NewPatient::new("Asha Rao", "9876543210"), Resolution::CheckFirst)
            .unwrap();

        let patient = result.patient().unwrap();
        assert_eq!(patient.phone, "9876543210");
        assert_eq!(db.list_patients("clinic-1", false).unwrap().len(), 1);
    }

    #[test]
    fn test_matching_phone_needs_decision() {
        let db = setup_db();
        let registry = PatientRegistry::new(&db);
        registry
            .register("clinic-1", NewPatient::new("Asha Rao", "9876543210"), Resolution::CheckFirst)
            .unwrap();

        let result = registry
            .register("clinic-1", NewPatient::new("asha rao", "09876543210"), Resolution::CheckFirst)
            .unwrap();

        match result {
            Registration::NeedsDecision(check) => {
                assert_eq!(check.primary().unwrap().match_type, MatchType::Both);
            }
            other => panic!("expected NeedsDecision, got {:?}", other),
        }
        assert_eq!(db.list_patients("clinic-1", false).unwrap().len(), 1);
    }

    #[test]
    fn test_create_anyway_and_link() {
        let db = setup_db();
        let registry = PatientRegistry::new(&db);
        let first = registry
            .register("clinic-1", NewPatient::new("Asha Rao", "9876543210"), Resolution::CheckFirst)
            .unwrap();
        let first_id = first.patient().unwrap().id.clone();

        let sibling = registry
            .register("clinic-1", NewPatient::new("Ravi Rao", "9876543210"), Resolution::CreateAnyway)
            .unwrap();
        assert!(matches!(sibling, Registration::Created(_)));

        let linked = registry
            .register(
                "clinic-1",
                NewPatient::new("Asha Rao", "9876543210"),
                Resolution::UseExisting(first_id.clone()),
            )
            .unwrap();
        assert_eq!(linked, Registration::Linked(first.patient().unwrap().clone()));
        assert_eq!(db.list_patients("clinic-1", false).unwrap().len(), 2);
    }

    #[test]
    fn test_validation_before_store() {
        let db = setup_db();
        let registry = PatientRegistry::new(&db);
        let err = registry
            .register("clinic-1", NewPatient::new("Asha", "12"), Resolution::CreateAnyway)
            .unwrap_err();
        assert!(matches!(err, PatientError::Validation(ValidationError::InvalidPhone(_))));
        assert!(db.list_patients("clinic-1", true).unwrap().is_empty());
    }

    #[test]
    fn test_update_normalizes() {
        let db = setup_db();
        let registry = PatientRegistry::new(&db);
        let created = registry
            .register("clinic-1", NewPatient::new("Asha Rao", "9876543210"), Resolution::CheckFirst)
            .unwrap();
        let mut patient = created.patient().unwrap().clone();
        patient.name = "asha  RAO-iyer".into();
        patient.phone = "+91 90000 00000".into();

        let saved = registry.update(patient).unwrap();
        assert_eq!(saved.name, "Asha Rao-iyer");
        assert_eq!(saved.phone, "9000000000");
    }

    #[test]
    fn test_deactivate_missing_patient() {
        let db = setup_db();
        let registry = PatientRegistry::new(&db);
        assert!(matches!(
            registry.deactivate("clinic-1", "nope"),
            Err(PatientError::NotFound(_))
        ));
    }
}
