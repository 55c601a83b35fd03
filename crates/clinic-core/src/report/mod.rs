//! Monthly reports.
//!
//! Two tables per period: revenue per day (from invoices) and medicine
//! usage (from examination prescriptions). Both cover a closed date range.

mod medicine_usage;
mod revenue;

pub use medicine_usage::*;
pub use revenue::*;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::Vnd;

/// Report errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid month (expected YYYY-MM): {0}")]
    InvalidMonth(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// A calendar month as a closed date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthRange {
    /// Month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let next_month = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next_month.and_then(|d| d.pred_opt()).unwrap_or(start);
        Self { start, end }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(month: &str) -> ReportResult<Self> {
        let trimmed = month.trim();
        let first = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
            .map_err(|_| ReportError::InvalidMonth(month.to_string()))?;
        Ok(Self::containing(first))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `YYYY-MM` label.
    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

/// Both report tables for one month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyReport {
    pub month: MonthRange,
    pub daily_revenue: Vec<DailyRevenue>,
    pub medicine_usage: Vec<MedicineUsage>,
    pub total_revenue: Vnd,
    pub total_patients: u32,
    /// Total revenue over the days in the month, rounded
    pub average_daily_revenue: Vnd,
}

/// Builds reports from stored invoices and examinations.
pub struct Reporter<'a> {
    db: &'a Database,
}

impl<'a> Reporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn monthly_report(&self, month: MonthRange) -> ReportResult<MonthlyReport> {
        let invoices = self.db.list_invoices()?;
        let daily_revenue = build_revenue_report(&invoices, month.start, month.end);

        let examinations: Vec<_> = self
            .db
            .list_examinations()?
            .into_iter()
            .filter(|e| e.exam_date.is_some_and(|d| month.contains(d)))
            .collect();
        let medicine_usage = build_medicine_usage_report(&examinations);

        let total_revenue = daily_revenue.iter().map(|d| d.revenue).sum();
        let total_patients = daily_revenue.iter().map(|d| d.patient_count).sum();
        let average_daily_revenue = average_per_day(total_revenue, daily_revenue.len());

        tracing::debug!(
            month = %month.label(),
            invoices = invoices.len(),
            examinations = examinations.len(),
            "Built monthly report"
        );

        Ok(MonthlyReport {
            month,
            daily_revenue,
            medicine_usage,
            total_revenue,
            total_patients,
            average_daily_revenue,
        })
    }
}

/// `round(part / total * 100)`, half away from zero; 0 when the total is 0.
pub(crate) fn percentage_of(part: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as i64
}

/// Rounded mean over `days`; 0 for an empty range.
pub(crate) fn average_per_day(total: Vnd, days: usize) -> Vnd {
    if days == 0 {
        return 0;
    }
    (total as f64 / days as f64).round() as Vnd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        let may = MonthRange::parse("2024-05").unwrap();
        assert_eq!(may.start, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(may.end, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(may.label(), "2024-05");
    }

    #[test]
    fn test_parse_month_edges() {
        let feb = MonthRange::parse("2024-02").unwrap();
        assert_eq!(feb.end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let dec = MonthRange::parse("2023-12").unwrap();
        assert_eq!(dec.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_month_rejects_garbage() {
        assert!(matches!(
            MonthRange::parse("2024-13"),
            Err(ReportError::InvalidMonth(_))
        ));
        assert!(MonthRange::parse("May 2024").is_err());
        assert!(MonthRange::parse("").is_err());
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(0, 0), 0);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(1, 200), 1);
        assert_eq!(percentage_of(1, 201), 0);
    }

    #[test]
    fn test_average_per_day() {
        assert_eq!(average_per_day(0, 0), 0);
        assert_eq!(average_per_day(600_000, 0), 0);
        assert_eq!(average_per_day(620_000, 31), 20_000);
        assert_eq!(average_per_day(600_000, 31), 19_355);
    }
}
