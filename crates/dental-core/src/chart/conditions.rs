//! At most one condition per tooth.

use tracing::debug;

use super::ChartResult;
use crate::db::ConditionStore;
use crate::models::{ConditionInput, ToothCondition, ToothNumber};

/// Record the current condition of a tooth.
///
/// Reads the existing condition first; when one exists it is replaced in
/// place (same id), otherwise a new row is inserted.
pub fn upsert_condition<S: ConditionStore>(
    store: &S,
    clinic_id: &str,
    patient_id: &str,
    tooth: ToothNumber,
    input: &ConditionInput,
) -> ChartResult<ToothCondition> {
    match store.get_condition(clinic_id, patient_id, tooth)? {
        Some(mut existing) => {
            existing.apply(input)?;
            store.update_condition(&existing)?;
            debug!(patient_id, tooth = %tooth, "tooth condition replaced");
            Ok(existing)
        }
        None => {
            let condition = ToothCondition::new(clinic_id, patient_id, tooth, input)?;
            store.insert_condition(&condition)?;
            debug!(patient_id, tooth = %tooth, "tooth condition recorded");
            Ok(condition)
        }
    }
}

/// Clear a tooth's condition. Returns whether one existed.
pub fn clear_condition<S: ConditionStore>(
    store: &S,
    clinic_id: &str,
    patient_id: &str,
    tooth: ToothNumber,
) -> ChartResult<bool> {
    match store.get_condition(clinic_id, patient_id, tooth)? {
        Some(existing) => Ok(store.delete_condition(clinic_id, &existing.id)?),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_patient, setup_db};
    use crate::models::Severity;

    fn input(kind: &str, severity: Severity) -> ConditionInput {
        ConditionInput {
            condition_type: kind.to_string(),
            description: None,
            severity,
            notes: None,
        }
    }

    #[test]
    fn test_second_upsert_replaces() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let tooth = ToothNumber::new(19).unwrap();

        let first = upsert_condition(&db, "clinic-1", &patient.id, tooth, &input("Caries", Severity::Mild)).unwrap();
        let second =
            upsert_condition(&db, "clinic-1", &patient.id, tooth, &input("Caries", Severity::Severe)).unwrap();

        assert_eq!(first.id, second.id);
        let all = db.list_conditions_for_patient("clinic-1", &patient.id).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].severity, Severity::Severe);
    }

    #[test]
    fn test_clear_condition() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let tooth = ToothNumber::new(2).unwrap();

        assert!(!clear_condition(&db, "clinic-1", &patient.id, tooth).unwrap());
        upsert_condition(&db, "clinic-1", &patient.id, tooth, &input("Fracture", Severity::Moderate)).unwrap();
        assert!(clear_condition(&db, "clinic-1", &patient.id, tooth).unwrap());
        assert!(db.get_condition("clinic-1", &patient.id, tooth).unwrap().is_none());
    }

    #[test]
    fn test_blank_condition_type_rejected() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let tooth = ToothNumber::new(2).unwrap();
        assert!(upsert_condition(&db, "clinic-1", &patient.id, tooth, &input("  ", Severity::Mild)).is_err());
    }
}
