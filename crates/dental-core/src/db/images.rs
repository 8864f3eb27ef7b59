//! Tooth image database operations.

use rusqlite::{params, Row};

use super::{parse_column, Database, DbResult, ImageStore};
use crate::models::{ToothImage, ToothNumber};

const IMAGE_COLUMNS: &str = r#"
    id, clinic_id, patient_id, tooth_number, image_url, storage_id,
    image_type, description, size_bytes, uploaded_at
"#;

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<ToothImage> {
    let size_bytes: i64 = row.get(8)?;
    Ok(ToothImage {
        id: row.get(0)?,
        clinic_id: row.get(1)?,
        patient_id: row.get(2)?,
        tooth_number: parse_column(row, 3)?,
        image_url: row.get(4)?,
        storage_id: row.get(5)?,
        image_type: parse_column(row, 6)?,
        description: row.get(7)?,
        size_bytes: size_bytes.max(0) as u64,
        uploaded_at: row.get(9)?,
    })
}

impl Database {
    fn query_images(&self, sql: &str, params: impl rusqlite::Params) -> DbResult<Vec<ToothImage>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, image_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl ImageStore for Database {
    fn insert_image(&self, image: &ToothImage) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO tooth_images (
                id, clinic_id, patient_id, tooth_number, image_url, storage_id,
                image_type, description, size_bytes, uploaded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                image.id,
                image.clinic_id,
                image.patient_id,
                image.tooth_number.code(),
                image.image_url,
                image.storage_id,
                image.image_type.as_str(),
                image.description,
                image.size_bytes.min(i64::MAX as u64) as i64,
                image.uploaded_at,
            ],
        )?;
        Ok(())
    }

    fn list_images(
        &self,
        clinic_id: &str,
        patient_id: &str,
        tooth: ToothNumber,
    ) -> DbResult<Vec<ToothImage>> {
        let sql = format!(
            r#"
            SELECT {} FROM tooth_images
            WHERE clinic_id = ?1 AND patient_id = ?2 AND tooth_number = ?3
            ORDER BY uploaded_at DESC
            "#,
            IMAGE_COLUMNS
        );
        self.query_images(&sql, params![clinic_id, patient_id, tooth.code()])
    }

    fn list_images_for_patient(&self, clinic_id: &str, patient_id: &str) -> DbResult<Vec<ToothImage>> {
        let sql = format!(
            r#"
            SELECT {} FROM tooth_images
            WHERE clinic_id = ?1 AND patient_id = ?2
            ORDER BY tooth_number, uploaded_at DESC
            "#,
            IMAGE_COLUMNS
        );
        self.query_images(&sql, [clinic_id, patient_id])
    }

    fn delete_image(&self, clinic_id: &str, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM tooth_images WHERE clinic_id = ?1 AND id = ?2", [clinic_id, id])?;
        Ok(rows_affected > 0)
    }

    fn count_images_for_storage_id(&self, clinic_id: &str, storage_id: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tooth_images WHERE clinic_id = ?1 AND storage_id = ?2",
            [clinic_id, storage_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
