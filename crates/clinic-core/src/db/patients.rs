//! Patient database operations.

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{columns, new_id, now_timestamp, Database, DbResult};
use crate::models::{Gender, NewPatient, Patient, PatientStatus, PatientUpdate};

const PATIENT_COLUMNS: &str = "id, name, gender, date_of_birth, address, phone_number, \
     registration_date, registration_time, status, created_at, updated_at";

/// Single-field equality filter over patients.
#[derive(Debug, Clone, PartialEq)]
pub enum PatientFilter {
    RegistrationDate(NaiveDate),
    Status(PatientStatus),
    PhoneNumber(String),
}

impl PatientFilter {
    fn column_and_value(&self) -> (&'static str, SqlValue) {
        match self {
            PatientFilter::RegistrationDate(date) => {
                ("registration_date", SqlValue::Text(date.to_string()))
            }
            PatientFilter::Status(status) => ("status", SqlValue::Text(status.as_str().into())),
            PatientFilter::PhoneNumber(phone) => ("phone_number", SqlValue::Text(phone.clone())),
        }
    }
}

impl Database {
    /// Insert a new patient with status `waiting`. Returns the new ID.
    pub fn insert_patient(&self, patient: &NewPatient) -> DbResult<String> {
        let id = new_id();
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, name, gender, date_of_birth, address, phone_number,
                registration_date, registration_time, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                id,
                patient.name,
                patient.gender.as_str(),
                patient.date_of_birth,
                patient.address,
                patient.phone_number,
                patient.registration_date,
                patient.registration_time,
                PatientStatus::Waiting.as_str(),
                now,
                now,
            ],
        )?;
        Ok(id)
    }

    /// Apply a partial update. Registration fields and status are not touched.
    pub fn update_patient(&self, id: &str, update: &PatientUpdate) -> DbResult<bool> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(name) = &update.name {
            assignments.push("name = ?");
            values.push(SqlValue::Text(name.clone()));
        }
        if let Some(gender) = update.gender {
            assignments.push("gender = ?");
            values.push(SqlValue::Text(gender.as_str().into()));
        }
        if let Some(dob) = update.date_of_birth {
            assignments.push("date_of_birth = ?");
            values.push(SqlValue::Text(dob.to_string()));
        }
        if let Some(address) = &update.address {
            assignments.push("address = ?");
            values.push(SqlValue::Text(address.clone()));
        }
        if let Some(phone) = &update.phone_number {
            assignments.push("phone_number = ?");
            values.push(SqlValue::Text(phone.clone()));
        }
        assignments.push("updated_at = ?");
        values.push(SqlValue::Text(now_timestamp()));
        values.push(SqlValue::Text(id.to_string()));

        let sql = format!("UPDATE patients SET {} WHERE id = ?", assignments.join(", "));
        let rows_affected = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(rows_affected > 0)
    }

    /// Move a patient in or out of the waiting list.
    pub fn update_patient_status(&self, id: &str, status: PatientStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now_timestamp(), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        let sql = format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], PatientRow::from_row)
            .optional()?;
        Ok(row.and_then(PatientRow::into_patient))
    }

    /// List all patients in registration order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let sql = format!(
            "SELECT {} FROM patients ORDER BY registration_date, registration_time, rowid",
            PATIENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], PatientRow::from_row)?;

        collect_patients(rows)
    }

    /// List patients matching a single-field filter, in registration order.
    pub fn list_patients_where(&self, filter: &PatientFilter) -> DbResult<Vec<Patient>> {
        let (column, value) = filter.column_and_value();
        let sql = format!(
            "SELECT {} FROM patients WHERE {} = ? ORDER BY registration_date, registration_time, rowid",
            PATIENT_COLUMNS, column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([value], PatientRow::from_row)?;

        collect_patients(rows)
    }

    /// Delete a patient. Examinations and invoices referring to it are kept.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Keep every readable patient; unrecoverable rows are skipped.
fn collect_patients(
    rows: impl Iterator<Item = rusqlite::Result<PatientRow>>,
) -> DbResult<Vec<Patient>> {
    let mut patients = Vec::new();
    for row in rows {
        if let Some(patient) = row?.into_patient() {
            patients.push(patient);
        }
    }
    Ok(patients)
}

/// Raw stored patient; every column read without type coercion.
struct PatientRow {
    id: SqlValue,
    name: SqlValue,
    gender: SqlValue,
    date_of_birth: SqlValue,
    address: SqlValue,
    phone_number: SqlValue,
    registration_date: SqlValue,
    registration_time: SqlValue,
    status: SqlValue,
    created_at: SqlValue,
    updated_at: SqlValue,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PatientRow {
            id: row.get(0)?,
            name: row.get(1)?,
            gender: row.get(2)?,
            date_of_birth: row.get(3)?,
            address: row.get(4)?,
            phone_number: row.get(5)?,
            registration_date: row.get(6)?,
            registration_time: row.get(7)?,
            status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    /// `None` when the gender or either date cannot be read. A missing
    /// status counts as waiting.
    fn into_patient(self) -> Option<Patient> {
        let id = columns::text(&self.id).unwrap_or_default();

        let gender = columns::text(&self.gender).as_deref().and_then(Gender::parse);
        let date_of_birth = columns::date(&self.date_of_birth);
        let registration_date = columns::date(&self.registration_date);
        let (Some(gender), Some(date_of_birth), Some(registration_date)) =
            (gender, date_of_birth, registration_date)
        else {
            tracing::debug!(patient_id = %id, "Unreadable patient gender or date; skipping row");
            return None;
        };

        let status = columns::text(&self.status)
            .map(|s| PatientStatus::parse(s.trim()))
            .unwrap_or_default();

        Some(Patient {
            name: columns::text(&self.name).unwrap_or_default(),
            gender,
            date_of_birth,
            address: columns::text(&self.address).unwrap_or_default(),
            phone_number: columns::text(&self.phone_number).unwrap_or_default(),
            registration_date,
            registration_time: columns::text(&self.registration_time).unwrap_or_default(),
            status,
            created_at: columns::text(&self.created_at).unwrap_or_default(),
            updated_at: columns::text(&self.updated_at).unwrap_or_default(),
            id,
        })
    }
}
