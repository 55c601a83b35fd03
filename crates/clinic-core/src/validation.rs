//! Form validation.
//!
//! Checks run before any write. A failed check aborts the operation with no
//! state change and reports every problem found, not just the first.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::{NewExamination, PatientForm, PatientUpdate};

/// Ten digits with a leading zero.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0\d{9}$").expect("phone pattern is valid"));

/// Form fields that can fail validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Field {
    Name,
    Gender,
    DateOfBirth,
    PhoneNumber,
    PatientName,
    Symptoms,
    Diagnosis,
    PatientId,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Gender => "gender",
            Field::DateOfBirth => "date of birth",
            Field::PhoneNumber => "phone number",
            Field::PatientName => "patient name",
            Field::Symptoms => "symptoms",
            Field::Diagnosis => "diagnosis",
            Field::PatientId => "patient",
        };
        f.write_str(name)
    }
}

/// One failed check.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("{0} is required")]
    Required(Field),

    #[error("phone number must be 10 digits starting with 0: {0}")]
    InvalidPhone(String),

    #[error("daily patient limit of {limit} reached for {date}")]
    DailyLimitReached { date: NaiveDate, limit: u32 },
}

/// All issues found on a form.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("{}", join_issues(.0))]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.0.contains(issue)
    }

    /// `Ok` when nothing was collected.
    pub fn into_result(issues: Vec<ValidationIssue>) -> Result<(), ValidationErrors> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(issues))
        }
    }
}

impl From<ValidationIssue> for ValidationErrors {
    fn from(issue: ValidationIssue) -> Self {
        ValidationErrors(vec![issue])
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a phone number against the local format.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

fn check_phone(phone: &str, issues: &mut Vec<ValidationIssue>) {
    if phone.is_empty() {
        issues.push(ValidationIssue::Required(Field::PhoneNumber));
    } else if !is_valid_phone(phone) {
        issues.push(ValidationIssue::InvalidPhone(phone.to_string()));
    }
}

fn check_required(value: &str, field: Field, issues: &mut Vec<ValidationIssue>) {
    if value.trim().is_empty() {
        issues.push(ValidationIssue::Required(field));
    }
}

/// Validate a patient intake form.
pub fn validate_patient_form(form: &PatientForm) -> Result<(), ValidationErrors> {
    let mut issues = Vec::new();
    check_required(&form.name, Field::Name, &mut issues);
    if form.gender.is_none() {
        issues.push(ValidationIssue::Required(Field::Gender));
    }
    if form.date_of_birth.is_none() {
        issues.push(ValidationIssue::Required(Field::DateOfBirth));
    }
    check_phone(&form.phone_number, &mut issues);
    ValidationErrors::into_result(issues)
}

/// Validate the fields a patient edit actually changes.
pub fn validate_patient_update(update: &PatientUpdate) -> Result<(), ValidationErrors> {
    let mut issues = Vec::new();
    if let Some(name) = &update.name {
        check_required(name, Field::Name, &mut issues);
    }
    if let Some(phone) = &update.phone_number {
        check_phone(phone, &mut issues);
    }
    ValidationErrors::into_result(issues)
}

/// Validate an examination form.
pub fn validate_examination(examination: &NewExamination) -> Result<(), ValidationErrors> {
    let mut issues = Vec::new();
    check_required(&examination.patient_name, Field::PatientName, &mut issues);
    check_required(&examination.symptoms, Field::Symptoms, &mut issues);
    check_required(&examination.diagnosis, Field::Diagnosis, &mut issues);
    ValidationErrors::into_result(issues)
}

/// Reject intake once the waiting list for the day is full.
pub fn check_daily_limit(waiting: usize, limit: u32, date: NaiveDate) -> Result<(), ValidationErrors> {
    if waiting >= limit as usize {
        return Err(ValidationIssue::DailyLimitReached { date, limit }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn complete_form() -> PatientForm {
        PatientForm {
            name: "Nguyễn Văn An".into(),
            gender: Some(Gender::Male),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
            address: String::new(),
            phone_number: "0912345678".into(),
        }
    }

    #[test]
    fn test_phone_format() {
        assert!(is_valid_phone("0912345678"));
        assert!(!is_valid_phone("912345678"));
        assert!(!is_valid_phone("09123456789"));
        assert!(!is_valid_phone("09a2345678"));
        assert!(!is_valid_phone("1912345678"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_complete_form_passes() {
        assert!(validate_patient_form(&complete_form()).is_ok());
    }

    #[test]
    fn test_all_issues_reported() {
        let err = validate_patient_form(&PatientForm::default()).unwrap_err();
        assert_eq!(
            err.issues(),
            &[
                ValidationIssue::Required(Field::Name),
                ValidationIssue::Required(Field::Gender),
                ValidationIssue::Required(Field::DateOfBirth),
                ValidationIssue::Required(Field::PhoneNumber),
            ]
        );
    }

    #[test]
    fn test_bad_phone_reported_with_value() {
        let form = PatientForm {
            phone_number: "12345".into(),
            ..complete_form()
        };
        let err = validate_patient_form(&form).unwrap_err();
        assert!(err.contains(&ValidationIssue::InvalidPhone("12345".into())));
        assert!(err.to_string().contains("12345"));
    }

    #[test]
    fn test_blank_name_is_missing() {
        let form = PatientForm {
            name: "   ".into(),
            ..complete_form()
        };
        assert!(validate_patient_form(&form)
            .unwrap_err()
            .contains(&ValidationIssue::Required(Field::Name)));
    }

    #[test]
    fn test_update_checks_only_present_fields() {
        assert!(validate_patient_update(&PatientUpdate::default()).is_ok());

        let update = PatientUpdate {
            phone_number: Some("0123".into()),
            ..Default::default()
        };
        assert!(validate_patient_update(&update).is_err());
    }

    #[test]
    fn test_examination_required_fields() {
        let exam = NewExamination {
            patient_id: "p-1".into(),
            patient_name: "An".into(),
            exam_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            symptoms: String::new(),
            diagnosis: "Cảm cúm".into(),
            medicines: vec![],
        };
        let err = validate_examination(&exam).unwrap_err();
        assert_eq!(err.issues(), &[ValidationIssue::Required(Field::Symptoms)]);
    }

    #[test]
    fn test_daily_limit() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(check_daily_limit(39, 40, date).is_ok());
        assert_eq!(
            check_daily_limit(40, 40, date).unwrap_err().issues(),
            &[ValidationIssue::DailyLimitReached { date, limit: 40 }]
        );
    }
}
