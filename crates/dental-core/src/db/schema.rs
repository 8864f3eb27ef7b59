//! SQLite schema definition.

/// Complete database schema for the clinic core.
///
/// Every table carries `clinic_id`; every accessor filters on it.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,                          -- canonical 10-digit form
    email TEXT,
    date_of_birth TEXT,
    gender TEXT,
    address TEXT,
    allergies TEXT NOT NULL DEFAULT '[]',         -- JSON array of strings
    current_medications TEXT NOT NULL DEFAULT '[]', -- JSON array of strings
    notes TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_clinic_phone ON patients(clinic_id, phone);
CREATE INDEX IF NOT EXISTS idx_patients_clinic_name ON patients(clinic_id, name);

-- ============================================================================
-- Appointments and follow-ups
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    appointment_date TEXT NOT NULL,
    appointment_time TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL DEFAULT 30,
    appointment_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'scheduled',
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_clinic_date ON appointments(clinic_id, appointment_date);

CREATE TABLE IF NOT EXISTS follow_ups (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    appointment_id TEXT REFERENCES appointments(id) ON DELETE SET NULL,
    reason TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    priority TEXT NOT NULL DEFAULT 'medium',
    due_date TEXT NOT NULL,
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_follow_ups_clinic_due ON follow_ups(clinic_id, due_date);

-- ============================================================================
-- Tooth chart
-- ============================================================================

CREATE TABLE IF NOT EXISTS dental_treatments (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    appointment_id TEXT,
    tooth_number TEXT NOT NULL CHECK (length(tooth_number) = 2),
    treatment_type TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'Planned',
    treatment_date TEXT NOT NULL,
    notes TEXT,
    created_by TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_treatments_patient ON dental_treatments(clinic_id, patient_id, tooth_number);

-- At most one condition per (patient, tooth)
CREATE TABLE IF NOT EXISTS tooth_conditions (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    tooth_number TEXT NOT NULL CHECK (length(tooth_number) = 2),
    condition_type TEXT NOT NULL,
    description TEXT,
    severity TEXT NOT NULL,
    notes TEXT,
    last_updated TEXT NOT NULL,
    UNIQUE (clinic_id, patient_id, tooth_number)
);

CREATE TABLE IF NOT EXISTS tooth_images (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    tooth_number TEXT NOT NULL CHECK (length(tooth_number) = 2),
    image_url TEXT NOT NULL,
    storage_id TEXT NOT NULL,                     -- remote blob id, may be shared
    image_type TEXT NOT NULL,
    description TEXT,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    uploaded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_images_tooth ON tooth_images(clinic_id, patient_id, tooth_number);
CREATE INDEX IF NOT EXISTS idx_images_storage ON tooth_images(storage_id);

-- ============================================================================
-- Treatment payments
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatment_payments (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    treatment_id TEXT NOT NULL REFERENCES dental_treatments(id) ON DELETE CASCADE,
    patient_id TEXT NOT NULL,
    total_amount REAL NOT NULL CHECK (total_amount >= 0),
    paid_amount REAL NOT NULL DEFAULT 0,
    payment_status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (clinic_id, treatment_id)
);

CREATE INDEX IF NOT EXISTS idx_payments_patient ON treatment_payments(clinic_id, patient_id);

-- Append-only
CREATE TABLE IF NOT EXISTS payment_transactions (
    id TEXT PRIMARY KEY,
    clinic_id TEXT NOT NULL,
    payment_id TEXT NOT NULL REFERENCES treatment_payments(id) ON DELETE CASCADE,
    amount REAL NOT NULL CHECK (amount > 0),
    payment_date TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_payment ON payment_transactions(clinic_id, payment_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_condition_unique_per_tooth() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO patients (id, clinic_id, name, phone) VALUES ('p1', 'c1', 'A', '9876543210')",
            [],
        )
        .unwrap();

        let insert = "INSERT INTO tooth_conditions (id, clinic_id, patient_id, tooth_number, condition_type, severity, last_updated)
                      VALUES (?, 'c1', 'p1', '03', 'Cavity', 'Mild', 'now')";
        conn.execute(insert, ["cond-1"]).unwrap();
        assert!(conn.execute(insert, ["cond-2"]).is_err());
    }

    #[test]
    fn test_transaction_amount_positive() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO patients (id, clinic_id, name, phone) VALUES ('p1', 'c1', 'A', '9876543210');
             INSERT INTO dental_treatments (id, clinic_id, patient_id, tooth_number, treatment_type, treatment_date)
                 VALUES ('t1', 'c1', 'p1', '03', 'Filling', '2024-01-01');
             INSERT INTO treatment_payments (id, clinic_id, treatment_id, patient_id, total_amount)
                 VALUES ('pay1', 'c1', 't1', 'p1', 100);",
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO payment_transactions (id, clinic_id, payment_id, amount, payment_date) VALUES ('x', 'c1', 'pay1', 0, '2024-01-01')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_payment_header_unique_per_clinic() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            "INSERT INTO patients (id, clinic_id, name, phone) VALUES ('p1', 'c1', 'A', '9876543210');
             INSERT INTO dental_treatments (id, clinic_id, patient_id, tooth_number, treatment_type, treatment_date)
                 VALUES ('t1', 'c1', 'p1', '03', 'Filling', '2024-01-01');
             INSERT INTO treatment_payments (id, clinic_id, treatment_id, patient_id, total_amount)
                 VALUES ('stray', 'c2', 't1', 'p1', 100);",
        )
        .unwrap();

        let insert = "INSERT INTO treatment_payments (id, clinic_id, treatment_id, patient_id, total_amount)
                      VALUES (?, 'c1', 't1', 'p1', 100)";
        conn.execute(insert, ["pay1"]).unwrap();
        assert!(conn.execute(insert, ["pay2"]).is_err());
    }
}
