//! Examination database operations.
//!
//! The medicines column holds JSON written by whatever client recorded the
//! visit. Every read rebuilds the record as JSON and passes it through the
//! prescription normalizer, so callers always get a repaired `Examination`.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use serde_json::{json, Value};

use super::{new_id, now_timestamp, Database, DbResult};
use crate::models::{Examination, NewExamination};

const EXAMINATION_COLUMNS: &str =
    "id, patient_id, patient_name, exam_date, symptoms, diagnosis, medicines";

/// Single-field equality filter over examinations.
#[derive(Debug, Clone, PartialEq)]
pub enum ExaminationFilter {
    PatientId(String),
    ExamDate(NaiveDate),
}

impl ExaminationFilter {
    fn column_and_value(&self) -> (&'static str, String) {
        match self {
            ExaminationFilter::PatientId(id) => ("patient_id", id.clone()),
            ExaminationFilter::ExamDate(date) => ("exam_date", date.to_string()),
        }
    }
}

impl Database {
    /// Insert a new examination. Returns the new ID.
    pub fn insert_examination(&self, examination: &NewExamination) -> DbResult<String> {
        let id = new_id();
        let now = now_timestamp();
        let medicines_json = serde_json::to_string(&examination.medicines)?;

        self.conn.execute(
            r#"
            INSERT INTO examinations (
                id, patient_id, patient_name, exam_date, symptoms,
                diagnosis, medicines, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                id,
                examination.patient_id,
                examination.patient_name,
                examination.exam_date,
                examination.symptoms,
                examination.diagnosis,
                medicines_json,
                now,
                now,
            ],
        )?;
        Ok(id)
    }

    /// Get an examination by ID.
    pub fn get_examination(&self, id: &str) -> DbResult<Option<Examination>> {
        let sql = format!("SELECT {} FROM examinations WHERE id = ?", EXAMINATION_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], ExaminationRow::from_row)
            .optional()?;
        Ok(row.map(|row| self.normalizer.normalize(&row.into_json())))
    }

    /// List all examinations by date, then insertion order.
    pub fn list_examinations(&self) -> DbResult<Vec<Examination>> {
        let sql = format!(
            "SELECT {} FROM examinations ORDER BY exam_date, rowid",
            EXAMINATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], ExaminationRow::from_row)?;

        let mut examinations = Vec::new();
        for row in rows {
            examinations.push(self.normalizer.normalize(&row?.into_json()));
        }
        Ok(examinations)
    }

    /// List examinations matching a single-field filter.
    pub fn list_examinations_where(&self, filter: &ExaminationFilter) -> DbResult<Vec<Examination>> {
        let (column, value) = filter.column_and_value();
        let sql = format!(
            "SELECT {} FROM examinations WHERE {} = ? ORDER BY exam_date, rowid",
            EXAMINATION_COLUMNS, column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([value], ExaminationRow::from_row)?;

        let mut examinations = Vec::new();
        for row in rows {
            examinations.push(self.normalizer.normalize(&row?.into_json()));
        }
        Ok(examinations)
    }
}

/// Raw stored examination; every column read as text.
struct ExaminationRow {
    id: String,
    patient_id: String,
    patient_name: String,
    exam_date: String,
    symptoms: String,
    diagnosis: String,
    medicines: String,
}

impl ExaminationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ExaminationRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            patient_name: row.get(2)?,
            exam_date: row.get(3)?,
            symptoms: row.get(4)?,
            diagnosis: row.get(5)?,
            medicines: row.get(6)?,
        })
    }

    /// Loosely-typed record for the normalizer.
    fn into_json(self) -> Value {
        let medicines = match serde_json::from_str::<Value>(&self.medicines) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(
                    examination_id = %self.id,
                    error = %e,
                    "Unreadable medicines column; treating as empty"
                );
                Value::Null
            }
        };

        json!({
            "id": self.id,
            "patient_id": self.patient_id,
            "patient_name": self.patient_name,
            "exam_date": self.exam_date,
            "symptoms": self.symptoms,
            "diagnosis": self.diagnosis,
            "medicines": medicines,
        })
    }
}
