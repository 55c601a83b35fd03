//! Clinic Core Library
//!
//! Local-first clinic management: patient intake, examinations with
//! prescriptions, invoicing and monthly reports.
//!
//! # Architecture
//!
//! ```text
//! Intake form → Validation → Waiting list (daily limit from regulations)
//!                                   │
//!                             Examination + prescription
//!                                   │
//!                     [STORAGE: medicines as loose JSON]
//!                                   │
//!                        Prescription Normalizer
//!                                   │
//!                 ┌─────────────────▼─────────────────┐
//!                 │          Fee Calculator           │
//!                 │  unit price = Price Estimator     │
//!                 │  medicine fee = Σ price × qty     │
//!                 │  total = consult + medicine + other│
//!                 └─────────────────┬─────────────────┘
//!                                   │
//!                               Invoice ──► patient marked processed
//!                                   │
//!                      ┌────────────┴────────────┐
//!                      ▼                         ▼
//!               Daily revenue              Medicine usage
//!                      └──────── Export ─────────┘
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, Examination, Medicine, Invoice, Regulation)
//! - [`billing`]: Prescription normalizer, price estimator, fee calculator, invoice drafts
//! - [`regulations`]: Regulation store and cache
//! - [`validation`]: Form validation
//! - [`workflow`]: Front-desk operations
//! - [`report`]: Monthly revenue and medicine usage
//! - [`export`]: Report export (JSON, CSV)
//! - [`config`]: TOML configuration

pub mod billing;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod regulations;
pub mod report;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use billing::{FeeCalculator, InvoiceDraft, MedicineFee, PrescriptionNormalizer, PriceEstimator};
pub use config::ClinicConfig;
pub use db::Database;
pub use models::{
    Examination, Gender, Invoice, Medicine, MedicineUnit, Patient, PatientStatus, Regulation, Vnd,
};
pub use regulations::{RegulationCache, RegulationStore};
pub use report::{MonthRange, MonthlyReport, Reporter};
pub use workflow::{Clinic, WorkflowError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invoice error: {0}")]
    InvoiceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        ClinicError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::SerializationError(e.to_string())
    }
}

impl From<validation::ValidationErrors> for ClinicError {
    fn from(e: validation::ValidationErrors) -> Self {
        ClinicError::InvalidInput(e.to_string())
    }
}

impl From<billing::InvoiceError> for ClinicError {
    fn from(e: billing::InvoiceError) -> Self {
        ClinicError::InvoiceError(e.to_string())
    }
}

impl From<WorkflowError> for ClinicError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::Database(e) => {
                tracing::warn!(error = %e, "Database operation failed");
                e.into()
            }
            WorkflowError::Validation(e) => e.into(),
            WorkflowError::Invoice(e) => e.into(),
            WorkflowError::NotFound(what) => ClinicError::NotFound(what),
            WorkflowError::AlreadyPaid(_) => ClinicError::InvoiceError(e.to_string()),
            WorkflowError::UnknownPaymentMethod(_) => ClinicError::InvalidInput(e.to_string()),
        }
    }
}

impl From<report::ReportError> for ClinicError {
    fn from(e: report::ReportError) -> Self {
        match e {
            report::ReportError::Database(e) => e.into(),
            report::ReportError::InvalidMonth(_) => ClinicError::InvalidInput(e.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default configuration.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    Ok(ClinicCore::new(db, ClinicConfig::default()))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    Ok(ClinicCore::new(db, ClinicConfig::default()))
}

/// Load a TOML config file and open the database it names.
#[uniffi::export]
pub fn open_with_config(config_path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = ClinicConfig::load(&config_path)
        .map_err(|e| ClinicError::InvalidInput(format!("{:#}", e)))?;
    let db = Database::open(&config.database_path)?;
    Ok(ClinicCore::new(db, config))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic handle for FFI.
///
/// Regulations start out loading; call `refresh_regulations` once after
/// opening and after every change made elsewhere.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
    regulations: Mutex<RegulationCache>,
    config: ClinicConfig,
}

impl ClinicCore {
    fn new(db: Database, config: ClinicConfig) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            regulations: Mutex::new(RegulationCache::new(&config)),
            config,
        })
    }
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Regulations
    // =========================================================================

    /// Cached regulations (fallback values while loading).
    pub fn get_regulations(&self) -> Result<FfiRegulation, ClinicError> {
        let cache = self.regulations.lock()?;
        Ok(FfiRegulation::from_cache(&cache))
    }

    /// Re-read regulations from the database.
    pub fn refresh_regulations(&self) -> Result<FfiRegulation, ClinicError> {
        let db = self.db.lock()?;
        let mut cache = self.regulations.lock()?;
        cache.refresh(&RegulationStore::new(&db));
        Ok(FfiRegulation::from_cache(&cache))
    }

    /// Replace the regulations. Returns `false` when rejected or not saved.
    pub fn update_regulations(
        &self,
        max_patients_per_day: u32,
        consultation_fee: i64,
    ) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        let store = RegulationStore::new(&db);
        let saved = store.update(Regulation {
            max_patients_per_day,
            consultation_fee,
        });
        if saved {
            self.regulations.lock()?.refresh(&store);
        }
        Ok(saved)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient on today's waiting list.
    pub fn register_patient(&self, form: FfiPatientForm) -> Result<String, ClinicError> {
        let form: models::PatientForm = form.try_into()?;
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        Ok(Clinic::new(&db, &self.config, &cache).register_patient(&form)?)
    }

    /// Edit a patient. `None` fields are left unchanged.
    pub fn update_patient(&self, id: String, update: FfiPatientUpdate) -> Result<(), ClinicError> {
        let update: models::PatientUpdate = update.try_into()?;
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        Ok(Clinic::new(&db, &self.config, &cache).update_patient(&id, &update)?)
    }

    pub fn delete_patient(&self, id: String) -> Result<(), ClinicError> {
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        Ok(Clinic::new(&db, &self.config, &cache).delete_patient(&id)?)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(&id)?.map(|p| p.into()))
    }

    /// Patients still waiting on a day (`YYYY-MM-DD`).
    pub fn waiting_list(&self, date: String) -> Result<Vec<FfiPatient>, ClinicError> {
        let date = parse_date(&date)?;
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        let patients = Clinic::new(&db, &self.config, &cache).waiting_list(date)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Search patients by name or phone.
    pub fn search_patients(&self, term: String) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        let patients = Clinic::new(&db, &self.config, &cache).search_patients(&term)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Examination Operations
    // =========================================================================

    /// Record a visit. Returns the examination ID.
    pub fn record_examination(&self, examination: FfiNewExamination) -> Result<String, ClinicError> {
        let examination: models::NewExamination = examination.try_into()?;
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        Ok(Clinic::new(&db, &self.config, &cache).record_examination(&examination)?)
    }

    pub fn get_examination(&self, id: String) -> Result<Option<FfiExamination>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_examination(&id)?.map(|e| e.into()))
    }

    pub fn examinations_for_patient(&self, patient_id: String) -> Result<Vec<FfiExamination>, ClinicError> {
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        let exams = Clinic::new(&db, &self.config, &cache).examinations_for_patient(&patient_id)?;
        Ok(exams.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    /// Estimated unit price for a medicine name and unit.
    pub fn estimate_price(&self, name: String, unit: String) -> i64 {
        PriceEstimator::new().estimate(&name, &unit)
    }

    /// Quantity pre-filled on a new prescription line.
    pub fn default_medicine_quantity(&self) -> u32 {
        self.config.default_medicine_quantity
    }

    pub fn payment_methods(&self) -> Vec<String> {
        self.config.payment_methods.clone()
    }

    /// Invoice draft for an examination, medicine fee calculated.
    pub fn draft_invoice(&self, examination_id: String) -> Result<FfiInvoiceDraft, ClinicError> {
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        let draft = Clinic::new(&db, &self.config, &cache).draft_invoice_for_examination(&examination_id)?;
        Ok(draft.into())
    }

    /// Save an invoice. When `examination_id` is set, the medicine fee is
    /// recalculated from that examination and the supplied value is ignored.
    pub fn finalize_invoice(&self, draft: FfiInvoiceDraft) -> Result<String, ClinicError> {
        let exam_date = parse_date(&draft.exam_date)?;
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        let clinic = Clinic::new(&db, &self.config, &cache);

        let mut invoice = InvoiceDraft::new(
            draft.patient_id,
            draft.patient_name,
            exam_date,
            draft.consultation_fee,
        );
        invoice.set_consultation_fee(draft.consultation_fee)?;
        invoice.set_other_fees(draft.other_fees)?;
        match &draft.examination_id {
            Some(examination_id) => {
                let examination = clinic.get_examination(examination_id)?;
                invoice.select_examination(&examination, clinic.calculator())?;
            }
            None => invoice.set_medicine_fee(draft.medicine_fee)?,
        }

        Ok(clinic.finalize_invoice(&invoice)?)
    }

    pub fn get_invoice(&self, id: String) -> Result<Option<FfiInvoice>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_invoice(&id)?.map(|i| i.into()))
    }

    pub fn list_invoices(&self) -> Result<Vec<FfiInvoice>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_invoices()?.into_iter().map(|i| i.into()).collect())
    }

    /// Record payment today with one of the configured methods.
    pub fn mark_invoice_paid(&self, id: String, payment_method: String) -> Result<(), ClinicError> {
        let db = self.db.lock()?;
        let cache = self.regulations.lock()?;
        Ok(Clinic::new(&db, &self.config, &cache).mark_invoice_paid(&id, &payment_method)?)
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Monthly report for `YYYY-MM`.
    pub fn monthly_report(&self, month: String) -> Result<FfiMonthlyReport, ClinicError> {
        let month = MonthRange::parse(&month)?;
        let db = self.db.lock()?;
        let report = Reporter::new(&db).monthly_report(month)?;
        Ok(report.into())
    }

    /// Export a monthly report as JSON.
    pub fn export_report_json(&self, month: String) -> Result<String, ClinicError> {
        let export = self.export_month(&month)?;
        Ok(export.to_json()?)
    }

    /// Export the daily revenue table as CSV.
    pub fn export_revenue_csv(&self, month: String) -> Result<String, ClinicError> {
        Ok(self.export_month(&month)?.revenue_csv())
    }

    /// Export the medicine usage table as CSV.
    pub fn export_medicine_csv(&self, month: String) -> Result<String, ClinicError> {
        Ok(self.export_month(&month)?.medicine_csv())
    }
}

impl ClinicCore {
    fn export_month(&self, month: &str) -> Result<export::ReportExport, ClinicError> {
        let month = MonthRange::parse(month)?;
        let db = self.db.lock()?;
        Ok(export::ReportExporter::new(&db).export_month(month)?)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ClinicError::InvalidInput(format!("Invalid date (expected YYYY-MM-DD): {}", s)))
}

fn parse_optional_date(s: Option<String>) -> Result<Option<NaiveDate>, ClinicError> {
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_date(text).map(Some),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe regulations.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegulation {
    pub max_patients_per_day: u32,
    pub consultation_fee: i64,
    pub is_loading: bool,
}

impl FfiRegulation {
    fn from_cache(cache: &RegulationCache) -> Self {
        Self {
            max_patients_per_day: cache.max_patients_per_day(),
            consultation_fee: cache.consultation_fee(),
            is_loading: cache.is_loading(),
        }
    }
}

/// FFI-safe intake form. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientForm {
    pub name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: String,
    pub phone_number: String,
}

impl TryFrom<FfiPatientForm> for models::PatientForm {
    type Error = ClinicError;

    fn try_from(form: FfiPatientForm) -> Result<Self, Self::Error> {
        Ok(models::PatientForm {
            name: form.name,
            gender: form.gender.as_deref().and_then(Gender::parse),
            date_of_birth: parse_optional_date(form.date_of_birth)?,
            address: form.address,
            phone_number: form.phone_number,
        })
    }
}

/// FFI-safe patient edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientUpdate {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl TryFrom<FfiPatientUpdate> for models::PatientUpdate {
    type Error = ClinicError;

    fn try_from(update: FfiPatientUpdate) -> Result<Self, Self::Error> {
        let gender = match update.gender {
            Some(label) => Some(
                Gender::parse(&label)
                    .ok_or_else(|| ClinicError::InvalidInput(format!("Unknown gender: {}", label)))?,
            ),
            None => None,
        };

        Ok(models::PatientUpdate {
            name: update.name,
            gender,
            date_of_birth: parse_optional_date(update.date_of_birth)?,
            address: update.address,
            phone_number: update.phone_number,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub address: String,
    pub phone_number: String,
    pub registration_date: String,
    pub registration_time: String,
    pub status: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            gender: patient.gender.as_str().to_string(),
            date_of_birth: patient.date_of_birth.to_string(),
            address: patient.address,
            phone_number: patient.phone_number,
            registration_date: patient.registration_date.to_string(),
            registration_time: patient.registration_time,
            status: patient.status.as_str().to_string(),
        }
    }
}

/// FFI-safe prescription line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    /// Empty for a new line; an ID is generated
    pub id: String,
    pub name: String,
    pub unit: String,
    pub quantity: u32,
    pub usage: String,
}

impl From<FfiMedicine> for Medicine {
    fn from(line: FfiMedicine) -> Self {
        let unit = MedicineUnit::parse(&line.unit).unwrap_or_default();
        let mut medicine = Medicine::new(line.name, unit, line.quantity);
        if !line.id.trim().is_empty() {
            medicine.id = line.id;
        }
        if !line.usage.trim().is_empty() {
            medicine.usage = line.usage;
        }
        medicine
    }
}

impl From<Medicine> for FfiMedicine {
    fn from(medicine: Medicine) -> Self {
        Self {
            id: medicine.id,
            name: medicine.name,
            unit: medicine.unit.as_str().to_string(),
            quantity: medicine.quantity,
            usage: medicine.usage,
        }
    }
}

/// FFI-safe examination form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewExamination {
    pub patient_id: String,
    pub patient_name: String,
    pub exam_date: String,
    pub symptoms: String,
    pub diagnosis: String,
    pub medicines: Vec<FfiMedicine>,
}

impl TryFrom<FfiNewExamination> for models::NewExamination {
    type Error = ClinicError;

    fn try_from(exam: FfiNewExamination) -> Result<Self, Self::Error> {
        Ok(models::NewExamination {
            patient_id: exam.patient_id,
            patient_name: exam.patient_name,
            exam_date: parse_date(&exam.exam_date)?,
            symptoms: exam.symptoms,
            diagnosis: exam.diagnosis,
            medicines: exam.medicines.into_iter().map(|m| m.into()).collect(),
        })
    }
}

/// FFI-safe examination.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExamination {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    /// Empty when the stored date is unreadable
    pub exam_date: String,
    pub symptoms: String,
    pub diagnosis: String,
    pub medicines: Vec<FfiMedicine>,
}

impl From<Examination> for FfiExamination {
    fn from(exam: Examination) -> Self {
        Self {
            id: exam.id,
            patient_id: exam.patient_id,
            patient_name: exam.patient_name,
            exam_date: exam.exam_date.map(|d| d.to_string()).unwrap_or_default(),
            symptoms: exam.symptoms,
            diagnosis: exam.diagnosis,
            medicines: exam.medicines.into_iter().map(|m| m.into()).collect(),
        }
    }
}

/// FFI-safe invoice draft.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoiceDraft {
    pub patient_id: String,
    pub patient_name: String,
    pub exam_date: String,
    /// Set when the medicine fee is calculated from an examination
    pub examination_id: Option<String>,
    pub consultation_fee: i64,
    pub medicine_fee: i64,
    pub other_fees: i64,
    pub total_amount: i64,
}

impl From<InvoiceDraft> for FfiInvoiceDraft {
    fn from(draft: InvoiceDraft) -> Self {
        Self {
            examination_id: draft.selected_examination().map(str::to_string),
            consultation_fee: draft.consultation_fee(),
            medicine_fee: draft.medicine_fee(),
            other_fees: draft.other_fees(),
            total_amount: draft.total(),
            exam_date: draft.exam_date.to_string(),
            patient_id: draft.patient_id,
            patient_name: draft.patient_name,
        }
    }
}

/// FFI-safe invoice.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInvoice {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub exam_date: String,
    pub consultation_fee: i64,
    pub medicine_fee: i64,
    pub other_fees: i64,
    pub total_amount: i64,
    pub is_paid: bool,
    pub payment_date: Option<String>,
    pub payment_method: Option<String>,
}

impl From<Invoice> for FfiInvoice {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            patient_id: invoice.patient_id,
            patient_name: invoice.patient_name,
            exam_date: invoice.exam_date.to_string(),
            consultation_fee: invoice.consultation_fee,
            medicine_fee: invoice.medicine_fee,
            other_fees: invoice.other_fees,
            total_amount: invoice.total_amount,
            is_paid: invoice.is_paid,
            payment_date: invoice.payment_date.map(|d| d.to_string()),
            payment_method: invoice.payment_method,
        }
    }
}

/// FFI-safe revenue row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailyRevenue {
    pub date: String,
    pub patient_count: u32,
    pub revenue: i64,
    pub percentage: i64,
}

/// FFI-safe medicine usage row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicineUsage {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub quantity: u64,
    pub usage_count: u32,
    pub percentage: i64,
}

/// FFI-safe monthly report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMonthlyReport {
    pub month: String,
    pub daily_revenue: Vec<FfiDailyRevenue>,
    pub medicine_usage: Vec<FfiMedicineUsage>,
    pub total_revenue: i64,
    pub total_patients: u32,
    pub average_daily_revenue: i64,
}

impl From<MonthlyReport> for FfiMonthlyReport {
    fn from(report: MonthlyReport) -> Self {
        Self {
            month: report.month.label(),
            daily_revenue: report
                .daily_revenue
                .into_iter()
                .map(|d| FfiDailyRevenue {
                    date: d.date.to_string(),
                    patient_count: d.patient_count,
                    revenue: d.revenue,
                    percentage: d.percentage,
                })
                .collect(),
            medicine_usage: report
                .medicine_usage
                .into_iter()
                .map(|m| FfiMedicineUsage {
                    id: m.id,
                    name: m.name,
                    unit: m.unit.as_str().to_string(),
                    quantity: m.quantity,
                    usage_count: m.usage_count,
                    percentage: m.percentage,
                })
                .collect(),
            total_revenue: report.total_revenue,
            total_patients: report.total_patients,
            average_daily_revenue: report.average_daily_revenue,
        }
    }
}
