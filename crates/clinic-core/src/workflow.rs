//! Front-desk workflows.
//!
//! Each operation validates its input, then performs one or more independent
//! writes. Multi-step saves are not transactional: a failure after the first
//! write leaves the earlier writes in place.

use chrono::{Local, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::billing::{FeeCalculator, InvoiceDraft, InvoiceError};
use crate::config::ClinicConfig;
use crate::db::{Database, DbError, ExaminationFilter, PatientFilter};
use crate::models::{
    Examination, NewExamination, NewPatient, Patient, PatientForm, PatientStatus, PatientUpdate,
};
use crate::regulations::RegulationCache;
use crate::validation::{
    check_daily_limit, validate_examination, validate_patient_form, validate_patient_update,
    Field, ValidationErrors, ValidationIssue,
};

/// Workflow errors.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invoice already paid: {0}")]
    AlreadyPaid(String),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Clinic operations over one database.
pub struct Clinic<'a> {
    db: &'a Database,
    config: &'a ClinicConfig,
    regulations: &'a RegulationCache,
    calculator: FeeCalculator,
}

impl<'a> Clinic<'a> {
    pub fn new(db: &'a Database, config: &'a ClinicConfig, regulations: &'a RegulationCache) -> Self {
        Self::with_calculator(db, config, regulations, FeeCalculator::new())
    }

    /// Use a calculator with a custom price table.
    pub fn with_calculator(
        db: &'a Database,
        config: &'a ClinicConfig,
        regulations: &'a RegulationCache,
        calculator: FeeCalculator,
    ) -> Self {
        Self {
            db,
            config,
            regulations,
            calculator,
        }
    }

    pub fn calculator(&self) -> &FeeCalculator {
        &self.calculator
    }

    // ========================================================================
    // Patients
    // ========================================================================

    /// Register a patient now. See [`Clinic::register_patient_at`].
    pub fn register_patient(&self, form: &PatientForm) -> WorkflowResult<String> {
        self.register_patient_at(form, Local::now().naive_local())
    }

    /// Validate the intake form, enforce the daily limit and add the patient
    /// to the waiting list for the day of `registered_at`.
    pub fn register_patient_at(
        &self,
        form: &PatientForm,
        registered_at: NaiveDateTime,
    ) -> WorkflowResult<String> {
        let registration_date = registered_at.date();
        let waiting = self.waiting_list(registration_date)?;
        check_daily_limit(
            waiting.len(),
            self.regulations.max_patients_per_day(),
            registration_date,
        )?;
        validate_patient_form(form)?;

        let (Some(gender), Some(date_of_birth)) = (form.gender, form.date_of_birth) else {
            // validate_patient_form already rejects both; kept for the type
            return Err(ValidationErrors::from(ValidationIssue::Required(Field::Gender)).into());
        };

        let patient = NewPatient {
            name: form.name.trim().to_string(),
            gender,
            date_of_birth,
            address: form.address.trim().to_string(),
            phone_number: form.phone_number.clone(),
            registration_date,
            registration_time: registered_at.format("%H:%M:%S").to_string(),
        };

        let id = self.db.insert_patient(&patient)?;
        tracing::info!(
            patient_id = %id,
            date = %registration_date,
            position = waiting.len() + 1,
            "Patient registered"
        );
        Ok(id)
    }

    /// Edit a patient's details. Registration date and time never change.
    pub fn update_patient(&self, id: &str, update: &PatientUpdate) -> WorkflowResult<()> {
        validate_patient_update(update)?;
        if !self.db.update_patient(id, update)? {
            return Err(WorkflowError::NotFound(format!("patient {}", id)));
        }
        Ok(())
    }

    /// Remove a patient record. Their examinations and invoices stay.
    pub fn delete_patient(&self, id: &str) -> WorkflowResult<()> {
        if !self.db.delete_patient(id)? {
            return Err(WorkflowError::NotFound(format!("patient {}", id)));
        }
        tracing::info!(patient_id = %id, "Patient deleted");
        Ok(())
    }

    pub fn get_patient(&self, id: &str) -> WorkflowResult<Patient> {
        self.db
            .get_patient(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("patient {}", id)))
    }

    /// Patients registered on `date` who have not been billed yet.
    pub fn waiting_list(&self, date: NaiveDate) -> WorkflowResult<Vec<Patient>> {
        let registered = self
            .db
            .list_patients_where(&PatientFilter::RegistrationDate(date))?;
        Ok(registered.into_iter().filter(Patient::is_waiting).collect())
    }

    /// Case-insensitive name search, or substring phone search. A blank term
    /// finds nothing.
    pub fn search_patients(&self, term: &str) -> WorkflowResult<Vec<Patient>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let patients = self.db.list_patients()?;
        Ok(patients
            .into_iter()
            .filter(|p| p.matches_search(term))
            .collect())
    }

    // ========================================================================
    // Examinations
    // ========================================================================

    /// Store a visit. Returns the new examination ID.
    pub fn record_examination(&self, examination: &NewExamination) -> WorkflowResult<String> {
        validate_examination(examination)?;
        let id = self.db.insert_examination(examination)?;
        tracing::info!(
            examination_id = %id,
            patient_id = %examination.patient_id,
            medicines = examination.medicines.len(),
            "Examination recorded"
        );
        Ok(id)
    }

    pub fn get_examination(&self, id: &str) -> WorkflowResult<Examination> {
        self.db
            .get_examination(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("examination {}", id)))
    }

    pub fn examinations_for_patient(&self, patient_id: &str) -> WorkflowResult<Vec<Examination>> {
        Ok(self
            .db
            .list_examinations_where(&ExaminationFilter::PatientId(patient_id.to_string()))?)
    }

    // ========================================================================
    // Invoices
    // ========================================================================

    /// Blank invoice for a patient, priced with the cached consultation fee.
    pub fn new_invoice_draft(&self, patient: &Patient, exam_date: NaiveDate) -> InvoiceDraft {
        InvoiceDraft::new(
            patient.id.clone(),
            patient.name.clone(),
            exam_date,
            self.regulations.consultation_fee(),
        )
    }

    /// Invoice for a stored examination, with the medicine fee calculated
    /// from its prescription.
    pub fn draft_invoice_for_examination(&self, examination_id: &str) -> WorkflowResult<InvoiceDraft> {
        let examination = self.get_examination(examination_id)?;
        let exam_date = examination
            .exam_date
            .ok_or_else(|| InvoiceError::MissingExamDate(examination.id.clone()))?;

        let mut draft = InvoiceDraft::new(
            examination.patient_id.clone(),
            examination.patient_name.clone(),
            exam_date,
            self.regulations.consultation_fee(),
        );
        draft.select_examination(&examination, &self.calculator)?;
        Ok(draft)
    }

    /// Save the invoice, then take the patient off the waiting list.
    ///
    /// The invoice is kept even when the status update fails.
    pub fn finalize_invoice(&self, draft: &InvoiceDraft) -> WorkflowResult<String> {
        if draft.patient_id.trim().is_empty() {
            return Err(ValidationErrors::from(ValidationIssue::Required(Field::PatientId)).into());
        }

        let invoice = draft.finalize();
        let id = self.db.insert_invoice(&invoice)?;
        tracing::info!(
            invoice_id = %id,
            patient_id = %invoice.patient_id,
            total_amount = invoice.total_amount,
            "Invoice finalized"
        );

        match self
            .db
            .update_patient_status(&invoice.patient_id, PatientStatus::Processed)
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(patient_id = %invoice.patient_id, "Invoiced patient not found; status unchanged");
            }
            Err(e) => {
                tracing::warn!(
                    patient_id = %invoice.patient_id,
                    error = %e,
                    "Failed to mark patient processed"
                );
            }
        }

        Ok(id)
    }

    /// Record payment today.
    pub fn mark_invoice_paid(&self, id: &str, payment_method: &str) -> WorkflowResult<()> {
        self.mark_invoice_paid_on(id, payment_method, Local::now().date_naive())
    }

    /// Record payment on a given day. Each invoice is paid at most once.
    pub fn mark_invoice_paid_on(
        &self,
        id: &str,
        payment_method: &str,
        payment_date: NaiveDate,
    ) -> WorkflowResult<()> {
        if !self.config.accepts_payment_method(payment_method) {
            return Err(WorkflowError::UnknownPaymentMethod(payment_method.to_string()));
        }

        let invoice = self
            .db
            .get_invoice(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("invoice {}", id)))?;
        if invoice.is_paid {
            return Err(WorkflowError::AlreadyPaid(id.to_string()));
        }

        if !self.db.mark_invoice_paid(id, payment_date, payment_method)? {
            // Paid between the read and the write
            return Err(WorkflowError::AlreadyPaid(id.to_string()));
        }
        tracing::info!(invoice_id = %id, method = payment_method, "Invoice paid");
        Ok(())
    }
}
