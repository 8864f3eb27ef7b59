//! Treatment payment and transaction database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_column, Database, DbResult, PaymentStore};
use crate::models::{PaymentTransaction, TreatmentPayment};

const PAYMENT_COLUMNS: &str = r#"
    id, clinic_id, treatment_id, patient_id, total_amount, paid_amount,
    payment_status, created_at, updated_at
"#;

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<TreatmentPayment> {
    Ok(TreatmentPayment {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        treatment_id: row.get(2)?,
        patient_id: row.get(3)?,
        total_amount: row.get(4)?,
        paid_amount: row.get(5)?,
        payment_status: parse_column(row, 6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<PaymentTransaction> {
    Ok(PaymentTransaction {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        payment_id: row.get(2)?,
        amount: row.get(3)?,
        payment_date: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl PaymentStore for Database {
    fn get_payment_for_treatment(
        &self,
        clinic_id: &str,
        treatment_id: &str,
    ) -> DbResult<Option<TreatmentPayment>> {
        let sql = format!(
            "SELECT {} FROM treatment_payments WHERE clinic_id = ?1 AND treatment_id = ?2",
            PAYMENT_COLUMNS
        );
        self.conn
            .query_row(&sql, [clinic_id, treatment_id], payment_from_row)
            .optional()
            .map_err(Into::into)
    }

    fn list_payments_for_patient(
        &self,
        clinic_id: &str,
        patient_id: &str,
    ) -> DbResult<Vec<TreatmentPayment>> {
        let sql = format!(
            "SELECT {} FROM treatment_payments WHERE clinic_id = ?1 AND patient_id = ?2 ORDER BY created_at",
            PAYMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([clinic_id, patient_id], payment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn insert_payment(&self, payment: &TreatmentPayment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO treatment_payments (
                id, clinic_id, treatment_id, patient_id, total_amount, paid_amount,
                payment_status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                payment.id,
                payment.clinic_id,
                payment.treatment_id,
                payment.patient_id,
                payment.total_amount,
                payment.paid_amount,
                payment.payment_status.as_str(),
                payment.created_at,
                payment.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_payment(&self, payment: &TreatmentPayment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE treatment_payments SET
                total_amount = ?3,
                paid_amount = ?4,
                payment_status = ?5,
                updated_at = datetime('now')
            WHERE id = ?1 AND clinic_id = ?2
            "#,
            params![
                payment.id,
                payment.clinic_id,
                payment.total_amount,
                payment.paid_amount,
                payment.payment_status.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn delete_payment(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM treatment_payments WHERE clinic_id = ?1 AND id = ?2",
            [clinic_id, id],
        )?;
        Ok(rows_affected > 0)
    }

    fn insert_transaction(&self, transaction: &PaymentTransaction) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO payment_transactions (
                id, clinic_id, payment_id, amount, payment_date, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                transaction.id,
                transaction.clinic_id,
                transaction.payment_id,
                transaction.amount,
                transaction.payment_date,
                transaction.notes,
                transaction.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_transactions(&self, clinic_id: &str, payment_id: &str) -> DbResult<Vec<PaymentTransaction>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, clinic_id, payment_id, amount, payment_date, notes, created_at
            FROM payment_transactions
            WHERE clinic_id = ?1 AND payment_id = ?2
            ORDER BY payment_date, created_at
            "#,
        )?;
        let rows = stmt.query_map([clinic_id, payment_id], transaction_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_patient, setup_db};
    use crate::db::TreatmentStore;
    use crate::models::{DentalTreatment, PaymentStatus, ToothNumber, TreatmentInput};

    fn seed_treatment(db: &Database, patient_id: &str) -> DentalTreatment {
        let input = TreatmentInput::new("Crown", "2024-02-01");
        let treatment =
            DentalTreatment::new("clinic-1", patient_id, ToothNumber::new(30).unwrap(), &input).unwrap();
        db.insert_treatment(&treatment).unwrap();
        treatment
    }

    #[test]
    fn test_header_and_transactions() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id);

        let header = TreatmentPayment::new("clinic-1", &treatment.id, &patient.id, 8000.0).unwrap();
        db.insert_payment(&header).unwrap();

        let tx = PaymentTransaction::new("clinic-1", &header.id, 2000.0, "2024-02-02", None).unwrap();
        db.insert_transaction(&tx).unwrap();

        let fetched = db
            .get_payment_for_treatment("clinic-1", &treatment.id)
            .unwrap()
            .unwrap();
        assert_eq!(fetched.payment_status, PaymentStatus::Pending);
        assert_eq!(db.list_transactions("clinic-1", &header.id).unwrap().len(), 1);
        assert_eq!(db.list_payments_for_patient("clinic-1", &patient.id).unwrap().len(), 1);
    }

    #[test]
    fn test_one_header_per_treatment() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id);

        let first = TreatmentPayment::new("clinic-1", &treatment.id, &patient.id, 100.0).unwrap();
        let second = TreatmentPayment::new("clinic-1", &treatment.id, &patient.id, 200.0).unwrap();
        db.insert_payment(&first).unwrap();
        assert!(db.insert_payment(&second).is_err());
    }

    #[test]
    fn test_deleting_treatment_cascades_to_ledger() {
        let db = setup_db();
        let patient = seed_patient(&db, "clinic-1", "Asha Rao", "9876543210");
        let treatment = seed_treatment(&db, &patient.id);
        let header = TreatmentPayment::new("clinic-1", &treatment.id, &patient.id, 100.0).unwrap();
        db.insert_payment(&header).unwrap();
        let tx = PaymentTransaction::new("clinic-1", &header.id, 50.0, "2024-02-02", None).unwrap();
        db.insert_transaction(&tx).unwrap();

        db.delete_treatment("clinic-1", &treatment.id).unwrap();

        assert!(db.get_payment_for_treatment("clinic-1", &treatment.id).unwrap().is_none());
        assert!(db.list_transactions("clinic-1", &header.id).unwrap().is_empty());
    }
}
