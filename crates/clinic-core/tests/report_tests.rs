//! Monthly report integration tests.

use chrono::NaiveDate;
use clinic_core::db::Database;
use clinic_core::export::ReportExporter;
use clinic_core::models::{Medicine, MedicineUnit, NewExamination, NewInvoice};
use clinic_core::report::{MonthRange, Reporter};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn invoice(db: &Database, patient: &str, exam_date: NaiveDate, medicine_fee: i64) {
    db.insert_invoice(&NewInvoice::new(
        patient.to_string(),
        patient.to_string(),
        exam_date,
        150_000,
        medicine_fee,
        0,
    ))
    .unwrap();
}

fn exam(db: &Database, exam_date: NaiveDate, medicines: Vec<Medicine>) {
    db.insert_examination(&NewExamination {
        patient_id: "p".into(),
        patient_name: "An".into(),
        exam_date,
        symptoms: "Ho".into(),
        diagnosis: "Viêm họng".into(),
        medicines,
    })
    .unwrap();
}

fn line(id: &str, name: &str, unit: MedicineUnit, quantity: u32) -> Medicine {
    let mut medicine = Medicine::new(name, unit, quantity);
    medicine.id = id.to_string();
    medicine
}

fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();

    // April boundary, May data, June boundary
    invoice(&db, "p-0", date(4, 30), 50_000);
    invoice(&db, "p-1", date(5, 1), 50_000);
    invoice(&db, "p-2", date(5, 1), 0);
    invoice(&db, "p-3", date(5, 31), 100_000);
    invoice(&db, "p-4", date(6, 1), 10_000);

    exam(&db, date(4, 30), vec![line("para", "Paracetamol", MedicineUnit::Vien, 100)]);
    exam(
        &db,
        date(5, 1),
        vec![
            line("para", "Paracetamol", MedicineUnit::Vien, 20),
            line("siro", "Siro ho", MedicineUnit::Chai, 1),
        ],
    );
    exam(&db, date(5, 20), vec![line("para", "Paracetamol", MedicineUnit::Vien, 10)]);
    exam(&db, date(5, 31), vec![line("amox", "Amoxicillin", MedicineUnit::Vien, 8)]);

    db
}

#[test]
fn test_revenue_covers_every_day_of_month() {
    let db = seeded();
    let report = Reporter::new(&db)
        .monthly_report(MonthRange::parse("2024-05").unwrap())
        .unwrap();

    assert_eq!(report.daily_revenue.len(), 31);
    assert_eq!(report.daily_revenue[0].date, date(5, 1));
    assert_eq!(report.daily_revenue[30].date, date(5, 31));

    let first = &report.daily_revenue[0];
    assert_eq!(first.patient_count, 2);
    assert_eq!(first.revenue, 350_000);
    assert_eq!(first.percentage, 58);

    let last = &report.daily_revenue[30];
    assert_eq!(last.revenue, 250_000);
    assert_eq!(last.percentage, 42);

    assert!(report.daily_revenue[1..30].iter().all(|d| d.revenue == 0 && d.percentage == 0));

    assert_eq!(report.total_revenue, 600_000);
    assert_eq!(report.total_patients, 3);
    assert_eq!(report.average_daily_revenue, 19_355);
}

#[test]
fn test_medicine_usage_only_counts_month() {
    let db = seeded();
    let report = Reporter::new(&db)
        .monthly_report(MonthRange::parse("2024-05").unwrap())
        .unwrap();

    let ids: Vec<&str> = report.medicine_usage.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["para", "amox", "siro"]);

    let para = &report.medicine_usage[0];
    assert_eq!(para.quantity, 30);
    assert_eq!(para.usage_count, 2);
    assert_eq!(para.percentage, 77);
    assert_eq!(report.medicine_usage[1].percentage, 21);
    assert_eq!(report.medicine_usage[2].percentage, 3);
}

#[test]
fn test_empty_month() {
    let db = seeded();
    let report = Reporter::new(&db)
        .monthly_report(MonthRange::parse("2024-02").unwrap())
        .unwrap();

    assert_eq!(report.daily_revenue.len(), 29);
    assert_eq!(report.total_revenue, 0);
    assert!(report.daily_revenue.iter().all(|d| d.percentage == 0));
    assert!(report.medicine_usage.is_empty());
}

#[test]
fn test_export_matches_report() {
    let db = seeded();
    let export = ReportExporter::new(&db)
        .export_month(MonthRange::parse("2024-05").unwrap())
        .unwrap();

    assert_eq!(export.metadata.total_revenue, 600_000);

    let revenue = export.revenue_csv();
    assert_eq!(revenue.lines().nth(1), Some("1,2024-05-01,2,350000,58"));

    let medicine = export.medicine_csv();
    assert_eq!(medicine.lines().nth(1), Some("1,Paracetamol,Viên,30,2,77"));

    let json: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
    assert_eq!(json["metadata"]["month"], "2024-05");
    assert_eq!(json["metadata"]["average_daily_revenue"], 19_355);
    assert_eq!(json["daily_revenue"].as_array().unwrap().len(), 31);
}

#[test]
fn test_unreadable_invoice_does_not_fail_report() {
    let db = seeded();
    db.conn()
        .execute(
            "INSERT INTO invoices (id, patient_id, patient_name, exam_date, total_amount, \
             created_at, updated_at) VALUES ('raw-1', 'p-x', 'An', '2024/05/02', 'abc', '', '')",
            [],
        )
        .unwrap();
    db.conn()
        .execute(
            "INSERT INTO invoices (id, patient_id, patient_name, exam_date, total_amount, \
             created_at, updated_at) VALUES ('raw-2', 'p-y', 'An', '2024-05-02', 'abc', '', '')",
            [],
        )
        .unwrap();

    let report = Reporter::new(&db)
        .monthly_report(MonthRange::parse("2024-05").unwrap())
        .unwrap();

    // The undated row is skipped; the unreadable total counts as zero
    assert_eq!(report.total_revenue, 600_000);
    assert_eq!(report.total_patients, 4);
    assert_eq!(report.daily_revenue[1].patient_count, 1);
    assert_eq!(report.daily_revenue[1].revenue, 0);
}
