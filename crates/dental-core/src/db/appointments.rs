//! Appointment and follow-up database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_column, AppointmentStore, Database, DbResult, FollowUpStore};
use crate::models::{Appointment, FollowUp};

const APPOINTMENT_COLUMNS: &str = r#"
    id, clinic_id, patient_id, appointment_date, appointment_time, duration_minutes,
    appointment_type, status, notes, created_at, updated_at
"#;

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        patient_id: row.get(2)?,
        appointment_date: row.get(3)?,
        appointment_time: row.get(4)?,
        duration_minutes: row.get(5)?,
        appointment_type: row.get(6)?,
        status: parse_column(row, 7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn follow_up_from_row(row: &Row<'_>) -> rusqlite::Result<FollowUp> {
    Ok(FollowUp {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        patient_id: row.get(2)?,
        appointment_id: row.get(3)?,
        reason: row.get(4)?,
        status: parse_column(row, 5)?,
        priority: parse_column(row, 6)?,
        due_date: row.get(7)?,
        created_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl AppointmentStore for Database {
    fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, clinic_id, patient_id, appointment_date, appointment_time, duration_minutes,
                appointment_type, status, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                appointment.id,
                appointment.clinic_id,
                appointment.patient_id,
                appointment.appointment_date,
                appointment.appointment_time,
                appointment.duration_minutes,
                appointment.appointment_type,
                appointment.status.as_str(),
                appointment.notes,
                appointment.created_at,
                appointment.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                appointment_date = ?3,
                appointment_time = ?4,
                duration_minutes = ?5,
                appointment_type = ?6,
                status = ?7,
                notes = ?8,
                updated_at = datetime('now')
            WHERE id = ?1 AND clinic_id = ?2
            "#,
            params![
                appointment.id,
                appointment.clinic_id,
                appointment.appointment_date,
                appointment.appointment_time,
                appointment.duration_minutes,
                appointment.appointment_type,
                appointment.status.as_str(),
                appointment.notes,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn get_appointment(&self, clinic_id: &str, id: &str) -> DbResult<Option<Appointment>> {
        let sql = format!(
            "SELECT {} FROM appointments WHERE clinic_id = ?1 AND id = ?2",
            APPOINTMENT_COLUMNS
        );
        self.conn
            .query_row(&sql, [clinic_id, id], appointment_from_row)
            .optional()
            .map_err(Into::into)
    }

    fn list_appointments(&self, clinic_id: &str, date: Option<&str>) -> DbResult<Vec<Appointment>> {
        let sql = format!(
            r#"
            SELECT {} FROM appointments
            WHERE clinic_id = ?1 AND (?2 IS NULL OR appointment_date = ?2)
            ORDER BY appointment_date, appointment_time
            "#,
            APPOINTMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![clinic_id, date], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn delete_appointment(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE clinic_id = ?1 AND id = ?2", [clinic_id, id])?;
        Ok(rows_affected > 0)
    }
}

impl FollowUpStore for Database {
    fn insert_follow_up(&self, follow_up: &FollowUp) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO follow_ups (
                id, clinic_id, patient_id, appointment_id, reason, status,
                priority, due_date, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                follow_up.id,
                follow_up.clinic_id,
                follow_up.patient_id,
                follow_up.appointment_id,
                follow_up.reason,
                follow_up.status.as_str(),
                follow_up.priority.as_str(),
                follow_up.due_date,
                follow_up.created_by,
                follow_up.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_follow_ups(&self, clinic_id: &str, patient_id: Option<&str>) -> DbResult<Vec<FollowUp>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, clinic_id, patient_id, appointment_id, reason, status,
                   priority, due_date, created_by, created_at
            FROM follow_ups
            WHERE clinic_id = ?1 AND (?2 IS NULL OR patient_id = ?2)
            ORDER BY due_date, created_at
            "#,
        )?;
        let rows = stmt.query_map(params![clinic_id, patient_id], follow_up_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn delete_follow_up(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM follow_ups WHERE clinic_id = ?1 AND id = ?2", [clinic_id, id])?;
        Ok(rows_affected > 0)
    }
}
