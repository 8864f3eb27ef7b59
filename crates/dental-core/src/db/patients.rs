//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{json_list_column, parse_optional_column, Database, DbResult, PatientStore};
use crate::models::Patient;

const PATIENT_COLUMNS: &str = r#"
    id, clinic_id, name, phone, email, date_of_birth, gender, address,
    allergies, current_medications, notes, is_active, created_at, updated_at
"#;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        date_of_birth: row.get(5)?,
        gender: parse_optional_column(row, 6)?,
        address: row.get(7)?,
        allergies: json_list_column(row, 8)?,
        current_medications: json_list_column(row, 9)?,
        notes: row.get(10)?,
        is_active: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl Database {
    fn query_patients(&self, sql: &str, params: impl rusqlite::Params) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl PatientStore for Database {
    fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, clinic_id, name, phone, email, date_of_birth, gender, address,
                allergies, current_medications, notes, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                patient.id,
                patient.clinic_id,
                patient.name,
                patient.phone,
                patient.email,
                patient.date_of_birth,
                patient.gender.map(|g| g.as_str()),
                patient.address,
                serde_json::to_string(&patient.allergies)?,
                serde_json::to_string(&patient.current_medications)?,
                patient.notes,
                patient.is_active,
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?3,
                phone = ?4,
                email = ?5,
                date_of_birth = ?6,
                gender = ?7,
                address = ?8,
                allergies = ?9,
                current_medications = ?10,
                notes = ?11,
                is_active = ?12,
                updated_at = datetime('now')
            WHERE id = ?1 AND clinic_id = ?2
            "#,
            params![
                patient.id,
                patient.clinic_id,
                patient.name,
                patient.phone,
                patient.email,
                patient.date_of_birth,
                patient.gender.map(|g| g.as_str()),
                patient.address,
                serde_json::to_string(&patient.allergies)?,
                serde_json::to_string(&patient.current_medications)?,
                patient.notes,
                patient.is_active,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn get_patient(&self, clinic_id: &str, id: &str) -> DbResult<Option<Patient>> {
        let sql = format!(
            "SELECT {} FROM patients WHERE clinic_id = ?1 AND id = ?2",
            PATIENT_COLUMNS
        );
        self.conn
            .query_row(&sql, [clinic_id, id], patient_from_row)
            .optional()
            .map_err(Into::into)
    }

    fn find_patients_by_phone(&self, clinic_id: &str, phone: &str) -> DbResult<Vec<Patient>> {
        let sql = format!(
            "SELECT {} FROM patients WHERE clinic_id = ?1 AND phone = ?2 AND is_active = 1 ORDER BY created_at",
            PATIENT_COLUMNS
        );
        self.query_patients(&sql, [clinic_id, phone])
    }

    fn search_patients(&self, clinic_id: &str, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query.trim());
        let sql = format!(
            "SELECT {} FROM patients WHERE clinic_id = ?1 AND name LIKE ?2 AND is_active = 1 ORDER BY name LIMIT ?3",
            PATIENT_COLUMNS
        );
        self.query_patients(&sql, params![clinic_id, pattern, limit as i64])
    }

    fn list_patients(&self, clinic_id: &str, include_inactive: bool) -> DbResult<Vec<Patient>> {
        let sql = format!(
            "SELECT {} FROM patients WHERE clinic_id = ?1 AND (?2 OR is_active = 1) ORDER BY name",
            PATIENT_COLUMNS
        );
        self.query_patients(&sql, params![clinic_id, include_inactive])
    }

    fn deactivate_patient(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET is_active = 0, updated_at = datetime('now') WHERE clinic_id = ?1 AND id = ?2",
            [clinic_id, id],
        )?;
        Ok(rows_affected > 0)
    }

    fn delete_patient(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE clinic_id = ?1 AND id = ?2", [clinic_id, id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_patient, setup_db};
    use crate::models::Gender;

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let mut patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        patient.gender = Some(Gender::Female);
        patient.allergies = vec!["Latex".into()];
        db.update_patient(&patient).unwrap();

        let retrieved = db.get_patient("clinic-1", &patient.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Asha Rao");
        assert_eq!(retrieved.gender, Some(Gender::Female));
        assert_eq!(retrieved.allergies, vec!["Latex".to_string()]);
    }

    #[test]
    fn test_get_is_clinic_scoped() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");

        assert!(db.get_patient("clinic-2", &patient.id).unwrap().is_none());
        assert!(db.find_patients_by_phone("clinic-2", "9876543210").unwrap().is_empty());
        assert!(!db.delete_patient("clinic-2", &patient.id).unwrap());
    }

    #[test]
    fn test_find_by_phone_skips_inactive() {
        let db = setup_db();
        let first = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        seed_patient(&db, "clinic-1", "Ravi Rao", "9876543210");

        assert_eq!(db.find_patients_by_phone("clinic-1", "9876543210").unwrap().len(), 2);

        db.deactivate_patient("clinic-1", &first.id).unwrap();
        let matches = db.find_patients_by_phone("clinic-1", "9876543210").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Ravi Rao");
    }

    #[test]
    fn test_search_and_list() {
        let db = setup_db();
        seed_patient(&db, "clinic-1", "Maya Iyer", "9000000001");
        seed_patient(&db, "clinic-1", "Mayank Shah", "9000000002");
        let luna = seed_patient(&db, "clinic-1", "Luna Das", "9000000003");

        let results = db.search_patients("clinic-1", "May", 10).unwrap();
        assert_eq!(results.len(), 2);

        db.deactivate_patient("clinic-1", &luna.id).unwrap();
        assert_eq!(db.list_patients("clinic-1", false).unwrap().len(), 2);
        assert_eq!(db.list_patients("clinic-1", true).unwrap().len(), 3);
    }
}
