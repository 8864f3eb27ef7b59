//! Dental treatment database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_column, Database, DbResult, TreatmentStore};
use crate::models::DentalTreatment;

const TREATMENT_COLUMNS: &str = r#"
    id, clinic_id, patient_id, appointment_id, tooth_number, treatment_type,
    description, status, treatment_date, notes, created_by, created_at, updated_at
"#;

fn treatment_from_row(row: &Row<'_>) -> rusqlite::Result<DentalTreatment> {
    Ok(DentalTreatment {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        patient_id: row.get(2)?,
        appointment_id: row.get(3)?,
        tooth_number: parse_column(row, 4)?,
        treatment_type: row.get(5)?,
        description: row.get(6)?,
        status: parse_column(row, 7)?,
        treatment_date: row.get(8)?,
        notes: row.get(9)?,
        created_by: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TreatmentStore for Database {
    fn insert_treatment(&self, treatment: &DentalTreatment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO dental_treatments (
                id, clinic_id, patient_id, appointment_id, tooth_number, treatment_type,
                description, status, treatment_date, notes, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                treatment.id,
                treatment.clinic_id,
                treatment.patient_id,
                treatment.appointment_id,
                treatment.tooth_number.code(),
                treatment.treatment_type,
                treatment.description,
                treatment.status.as_str(),
                treatment.treatment_date,
                treatment.notes,
                treatment.created_by,
                treatment.created_at,
                treatment.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_treatment(&self, treatment: &DentalTreatment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE dental_treatments SET
                appointment_id = ?3,
                tooth_number = ?4,
                treatment_type = ?5,
                description = ?6,
                status = ?7,
                treatment_date = ?8,
                notes = ?9,
                updated_at = datetime('now')
            WHERE id = ?1 AND clinic_id = ?2
            "#,
            params![
                treatment.id,
                treatment.clinic_id,
                treatment.appointment_id,
                treatment.tooth_number.code(),
                treatment.treatment_type,
                treatment.description,
                treatment.status.as_str(),
                treatment.treatment_date,
                treatment.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn get_treatment(&self, clinic_id: &str, id: &str) -> DbResult<Option<DentalTreatment>> {
        let sql = format!(
            "SELECT {} FROM dental_treatments WHERE clinic_id = ?1 AND id = ?2",
            TREATMENT_COLUMNS
        );
        self.conn
            .query_row(&sql, [clinic_id, id], treatment_from_row)
            .optional()
            .map_err(Into::into)
    }

    fn list_treatments_for_patient(
        &self,
        clinic_id: &str,
        patient_id: &str,
    ) -> DbResult<Vec<DentalTreatment>> {
        let sql = format!(
            r#"
            SELECT {} FROM dental_treatments
            WHERE clinic_id = ?1 AND patient_id = ?2
            ORDER BY treatment_date DESC, created_at DESC
            "#,
            TREATMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([clinic_id, patient_id], treatment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn delete_treatment(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM dental_treatments WHERE clinic_id = ?1 AND id = ?2",
            [clinic_id, id],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_patient, setup_db};
    use crate::models::{ToothNumber, TreatmentInput, TreatmentStatus};

    #[test]
    fn test_insert_and_list() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");

        let input = TreatmentInput::new("Filling", "2024-02-01");
        let tooth = ToothNumber::new(14).unwrap();
        let treatment = DentalTreatment::new("clinic-1", &patient.id, tooth, &input).unwrap();
        db.insert_treatment(&treatment).unwrap();

        let listed = db.list_treatments_for_patient("clinic-1", &patient.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].tooth_number, tooth);
        assert_eq!(listed[0].status, TreatmentStatus::Planned);
        assert!(db.list_treatments_for_patient("clinic-2", &patient.id).unwrap().is_empty());
    }

    #[test]
    fn test_update_status() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let input = TreatmentInput::new("Root Canal", "2024-02-01");
        let mut treatment =
            DentalTreatment::new("clinic-1", &patient.id, ToothNumber::new(3).unwrap(), &input).unwrap();
        db.insert_treatment(&treatment).unwrap();

        treatment.status = TreatmentStatus::InProgress;
        assert!(db.update_treatment(&treatment).unwrap());

        let retrieved = db.get_treatment("clinic-1", &treatment.id).unwrap().unwrap();
        assert_eq!(retrieved.status, TreatmentStatus::InProgress);
    }

    #[test]
    fn test_delete_scoped_by_clinic() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let input = TreatmentInput::new("Extraction", "2024-02-01");
        let treatment =
            DentalTreatment::new("clinic-1", &patient.id, ToothNumber::new(32).unwrap(), &input).unwrap();
        db.insert_treatment(&treatment).unwrap();

        assert!(!db.delete_treatment("clinic-2", &treatment.id).unwrap());
        assert!(db.delete_treatment("clinic-1", &treatment.id).unwrap());
        assert!(db.get_treatment("clinic-1", &treatment.id).unwrap().is_none());
    }
}
