//! Invoice database operations.

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, OptionalExtension, Row};

use super::{columns, new_id, now_timestamp, Database, DbResult};
use crate::models::{Invoice, NewInvoice};

const INVOICE_COLUMNS: &str = "id, patient_id, patient_name, exam_date, consultation_fee, \
     medicine_fee, other_fees, total_amount, is_paid, payment_date, payment_method";

/// Single-field equality filter over invoices.
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceFilter {
    PatientId(String),
    ExamDate(NaiveDate),
    IsPaid(bool),
}

impl InvoiceFilter {
    fn column_and_value(&self) -> (&'static str, SqlValue) {
        match self {
            InvoiceFilter::PatientId(id) => ("patient_id", SqlValue::Text(id.clone())),
            InvoiceFilter::ExamDate(date) => ("exam_date", SqlValue::Text(date.to_string())),
            InvoiceFilter::IsPaid(paid) => ("is_paid", SqlValue::Integer(i64::from(*paid))),
        }
    }
}

impl Database {
    /// Insert a new unpaid invoice. Returns the new ID.
    pub fn insert_invoice(&self, invoice: &NewInvoice) -> DbResult<String> {
        let id = new_id();
        let now = now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO invoices (
                id, patient_id, patient_name, exam_date, consultation_fee,
                medicine_fee, other_fees, total_amount, is_paid, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10)
            "#,
            params![
                id,
                invoice.patient_id,
                invoice.patient_name,
                invoice.exam_date,
                invoice.consultation_fee,
                invoice.medicine_fee,
                invoice.other_fees,
                invoice.total_amount,
                now,
                now,
            ],
        )?;
        Ok(id)
    }

    /// Record payment. Only an unpaid invoice changes; returns `false` for a
    /// missing or already-paid invoice.
    pub fn mark_invoice_paid(
        &self,
        id: &str,
        payment_date: NaiveDate,
        payment_method: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE invoices SET
                is_paid = 1,
                payment_date = ?2,
                payment_method = ?3,
                updated_at = ?4
            WHERE id = ?1 AND is_paid = 0
            "#,
            params![id, payment_date, payment_method, now_timestamp()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an invoice by ID.
    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], InvoiceRow::from_row)
            .optional()?;
        Ok(row.and_then(InvoiceRow::into_invoice))
    }

    /// List all invoices by exam date, then insertion order.
    pub fn list_invoices(&self) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {} FROM invoices ORDER BY exam_date, rowid",
            INVOICE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], InvoiceRow::from_row)?;

        collect_invoices(rows)
    }

    /// List invoices matching a single-field filter.
    pub fn list_invoices_where(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        let (column, value) = filter.column_and_value();
        let sql = format!(
            "SELECT {} FROM invoices WHERE {} = ? ORDER BY exam_date, rowid",
            INVOICE_COLUMNS, column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([value], InvoiceRow::from_row)?;

        collect_invoices(rows)
    }
}

/// Keep every readable invoice; unrecoverable rows are skipped.
fn collect_invoices(
    rows: impl Iterator<Item = rusqlite::Result<InvoiceRow>>,
) -> DbResult<Vec<Invoice>> {
    let mut invoices = Vec::new();
    for row in rows {
        if let Some(invoice) = row?.into_invoice() {
            invoices.push(invoice);
        }
    }
    Ok(invoices)
}

/// Raw stored invoice; every column read without type coercion.
struct InvoiceRow {
    id: SqlValue,
    patient_id: SqlValue,
    patient_name: SqlValue,
    exam_date: SqlValue,
    consultation_fee: SqlValue,
    medicine_fee: SqlValue,
    other_fees: SqlValue,
    total_amount: SqlValue,
    is_paid: SqlValue,
    payment_date: SqlValue,
    payment_method: SqlValue,
}

impl InvoiceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(InvoiceRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            patient_name: row.get(2)?,
            exam_date: row.get(3)?,
            consultation_fee: row.get(4)?,
            medicine_fee: row.get(5)?,
            other_fees: row.get(6)?,
            total_amount: row.get(7)?,
            is_paid: row.get(8)?,
            payment_date: row.get(9)?,
            payment_method: row.get(10)?,
        })
    }

    /// Repair fees and the paid flag; `None` when the exam date is unreadable.
    fn into_invoice(self) -> Option<Invoice> {
        let id = columns::text(&self.id).unwrap_or_default();
        let Some(exam_date) = columns::date(&self.exam_date) else {
            tracing::debug!(invoice_id = %id, "Unreadable invoice exam date; skipping row");
            return None;
        };

        Some(Invoice {
            patient_id: columns::text(&self.patient_id).unwrap_or_default(),
            patient_name: columns::text(&self.patient_name).unwrap_or_default(),
            exam_date,
            consultation_fee: columns::money(&self.consultation_fee),
            medicine_fee: columns::money(&self.medicine_fee),
            other_fees: columns::money(&self.other_fees),
            total_amount: columns::money(&self.total_amount),
            is_paid: columns::flag(&self.is_paid),
            payment_date: columns::date(&self.payment_date),
            payment_method: columns::text(&self.payment_method),
            id,
        })
    }
}
