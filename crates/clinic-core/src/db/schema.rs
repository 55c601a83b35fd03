//! SQLite schema definition.

/// Complete database schema for the clinic.
///
/// Patients, examinations and invoices are linked only by `patient_id`; no
/// foreign keys are declared between them.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    gender TEXT NOT NULL,                        -- 'Nam' | 'Nữ'
    date_of_birth TEXT NOT NULL,                 -- YYYY-MM-DD
    address TEXT NOT NULL DEFAULT '',
    phone_number TEXT NOT NULL,
    registration_date TEXT NOT NULL,             -- YYYY-MM-DD, immutable
    registration_time TEXT NOT NULL,             -- HH:MM:SS, immutable
    status TEXT NOT NULL DEFAULT 'waiting',      -- waiting, processed
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_registration ON patients(registration_date, status);
CREATE INDEX IF NOT EXISTS idx_patients_phone ON patients(phone_number);

-- ============================================================================
-- Examinations (created once per visit, never updated)
-- ============================================================================

CREATE TABLE IF NOT EXISTS examinations (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    patient_name TEXT NOT NULL,                  -- snapshot at visit time
    exam_date TEXT NOT NULL,
    symptoms TEXT NOT NULL DEFAULT '',
    diagnosis TEXT NOT NULL DEFAULT '',
    medicines TEXT NOT NULL DEFAULT '[]',        -- JSON, shape not guaranteed
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_examinations_patient ON examinations(patient_id);
CREATE INDEX IF NOT EXISTS idx_examinations_date ON examinations(exam_date);

-- ============================================================================
-- Invoices (paid exactly once, never deleted)
-- ============================================================================

CREATE TABLE IF NOT EXISTS invoices (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    patient_name TEXT NOT NULL,                  -- snapshot at billing time
    exam_date TEXT NOT NULL,
    consultation_fee INTEGER NOT NULL DEFAULT 0,
    medicine_fee INTEGER NOT NULL DEFAULT 0,
    other_fees INTEGER NOT NULL DEFAULT 0,
    total_amount INTEGER NOT NULL DEFAULT 0,
    is_paid INTEGER NOT NULL DEFAULT 0,
    payment_date TEXT,
    payment_method TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoices_patient ON invoices(patient_id);
CREATE INDEX IF NOT EXISTS idx_invoices_date ON invoices(exam_date);

-- ============================================================================
-- Settings (key/value, JSON values)
-- ============================================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
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
    fn test_schema_is_reentrant() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_no_foreign_keys_between_records() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // An examination for a patient that does not exist is accepted
        let result = conn.execute(
            "INSERT INTO examinations (id, patient_id, patient_name, exam_date, created_at, updated_at)
             VALUES ('e-1', 'missing', 'Ghost', '2024-05-01', '', '')",
            [],
        );
        assert!(result.is_ok());
    }
}
