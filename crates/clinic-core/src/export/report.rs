//! Monthly report export.

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::models::Vnd;
use crate::report::{DailyRevenue, MedicineUsage, MonthRange, MonthlyReport, ReportResult, Reporter};

/// Exported monthly report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportExport {
    /// Export metadata
    pub metadata: ReportMetadata,
    pub daily_revenue: Vec<DailyRevenue>,
    pub medicine_usage: Vec<MedicineUsage>,
}

/// Report export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// `YYYY-MM`
    pub month: String,
    pub start_date: String,
    pub end_date: String,
    pub total_revenue: Vnd,
    pub total_patients: u32,
    pub average_daily_revenue: Vnd,
    /// Export timestamp
    pub exported_at: String,
}

impl ReportExport {
    pub fn from_report(report: &MonthlyReport) -> Self {
        Self {
            metadata: ReportMetadata {
                month: report.month.label(),
                start_date: report.month.start.to_string(),
                end_date: report.month.end.to_string(),
                total_revenue: report.total_revenue,
                total_patients: report.total_patients,
                average_daily_revenue: report.average_daily_revenue,
                exported_at: chrono::Utc::now().to_rfc3339(),
            },
            daily_revenue: report.daily_revenue.clone(),
            medicine_usage: report.medicine_usage.clone(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Revenue table as CSV.
    pub fn revenue_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("stt,date,patient_count,revenue,percentage\n");

        for (index, day) in self.daily_revenue.iter().enumerate() {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                index + 1,
                day.date,
                day.patient_count,
                day.revenue,
                day.percentage,
            ));
        }

        csv
    }

    /// Medicine usage table as CSV.
    pub fn medicine_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("stt,medicine,unit,quantity,usage_count,percentage\n");

        for (index, row) in self.medicine_usage.iter().enumerate() {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                index + 1,
                escape_csv(&row.name),
                escape_csv(row.unit.as_str()),
                row.quantity,
                row.usage_count,
                row.percentage,
            ));
        }

        csv
    }
}

/// Builds exports straight from the database.
pub struct ReportExporter<'a> {
    reporter: Reporter<'a>,
}

impl<'a> ReportExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            reporter: Reporter::new(db),
        }
    }

    pub fn export_month(&self, month: MonthRange) -> ReportResult<ReportExport> {
        let report = self.reporter.monthly_report(month)?;
        Ok(ReportExport::from_report(&report))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medicine, MedicineUnit, NewExamination, NewInvoice};
    use chrono::NaiveDate;

    fn seed(db: &Database) {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        db.insert_invoice(&NewInvoice::new(
            "p-1".into(),
            "An".into(),
            date,
            150_000,
            100_000,
            0,
        ))
        .unwrap();
        db.insert_examination(&NewExamination {
            patient_id: "p-1".into(),
            patient_name: "An".into(),
            exam_date: date,
            symptoms: "Ho".into(),
            diagnosis: "Viêm họng".into(),
            medicines: vec![
                Medicine::new("Paracetamol", MedicineUnit::Vien, 20),
                Medicine::new("Siro ho, loại 1", MedicineUnit::Chai, 1),
            ],
        })
        .unwrap();
    }

    fn export() -> ReportExport {
        let db = Database::open_in_memory().unwrap();
        seed(&db);
        ReportExporter::new(&db)
            .export_month(MonthRange::parse("2024-05").unwrap())
            .unwrap()
    }

    #[test]
    fn test_metadata() {
        let export = export();
        assert_eq!(export.metadata.month, "2024-05");
        assert_eq!(export.metadata.start_date, "2024-05-01");
        assert_eq!(export.metadata.end_date, "2024-05-31");
        assert_eq!(export.metadata.total_revenue, 250_000);
        assert_eq!(export.metadata.total_patients, 1);
        // 250_000 over 31 days
        assert_eq!(export.metadata.average_daily_revenue, 8_065);
    }

    #[test]
    fn test_revenue_csv_has_row_per_day() {
        let csv = export().revenue_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 32); // Header + 31 days
        assert!(lines[0].starts_with("stt,date"));
        assert_eq!(lines[2], "2,2024-05-02,1,250000,100");
    }

    #[test]
    fn test_medicine_csv() {
        let csv = export().medicine_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3); // Header + 2 medicines
        assert!(lines[1].contains("Paracetamol"));
        assert!(lines[2].contains("\"Siro ho, loại 1\""));
    }

    #[test]
    fn test_json_export() {
        let json = export().to_json().unwrap();
        assert!(json.contains("Paracetamol"));
        assert!(json.contains("\"total_revenue\": 250000"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
