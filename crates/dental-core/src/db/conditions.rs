//! Tooth condition database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_column, ConditionStore, Database, DbResult};
use crate::models::{ToothCondition, ToothNumber};

const CONDITION_COLUMNS: &str = r#"
    id, clinic_id, patient_id, tooth_number, condition_type, description,
    severity, notes, last_updated
"#;

fn condition_from_row(row: &Row<'_>) -> rusqlite::Result<ToothCondition> {
    Ok(ToothCondition {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        patient_id: row.get(2)?,
        tooth_number: parse_column(row, 3)?,
        condition_type: row.get(4)?,
        description: row.get(5)?,
        severity: parse_column(row, 6)?,
        notes: row.get(7)?,
        last_updated: row.get(8)?,
    })
}

impl ConditionStore for Database {
    fn get_condition(
        &self,
        clinic_id: &str,
        patient_id: &str,
        tooth: ToothNumber,
    ) -> DbResult<Option<ToothCondition>> {
        let sql = format!(
            "SELECT {} FROM tooth_conditions WHERE clinic_id = ?1 AND patient_id = ?2 AND tooth_number = ?3",
            CONDITION_COLUMNS
        );
        self.conn
            .query_row(&sql, params![clinic_id, patient_id, tooth.code()], condition_from_row)
            .optional()
            .map_err(Into::into)
    }

    fn list_conditions_for_patient(
        &self,
        clinic_id: &str,
        patient_id: &str,
    ) -> DbResult<Vec<ToothCondition>> {
        let sql = format!(
            "SELECT {} FROM tooth_conditions WHERE clinic_id = ?1 AND patient_id = ?2 ORDER BY tooth_number",
            CONDITION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([clinic_id, patient_id], condition_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert_condition(&self, condition: &ToothCondition) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO tooth_conditions (
                id, clinic_id, patient_id, tooth_number, condition_type, description,
                severity, notes, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                condition.id,
                condition.clinic_id,
                condition.patient_id,
                condition.tooth_number.code(),
                condition.condition_type,
                condition.description,
                condition.severity.as_str(),
                condition.notes,
                condition.last_updated,
            ],
        )?;
        Ok(())
    }

    fn update_condition(&self, condition: &ToothCondition) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE tooth_conditions SET
                condition_type = ?3,
                description = ?4,
                severity = ?5,
                notes = ?6,
                last_updated = ?7
            WHERE id = ?1 AND clinic_id = ?2
            "#,
            params![
                condition.id,
                condition.clinic_id,
                condition.condition_type,
                condition.description,
                condition.severity.as_str(),
                condition.notes,
                condition.last_updated,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn delete_condition(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM tooth_conditions WHERE clinic_id = ?1 AND id = ?2",
            [clinic_id, id],
        )?;
        Ok(rows_affected > 0)
    }
}
