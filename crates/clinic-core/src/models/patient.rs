//! Patient models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Patient gender as recorded on the intake form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[serde(rename = "Nam")]
    Male,
    #[serde(rename = "Nữ")]
    Female,
}

impl Gender {
    /// Stored/display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Nam",
            Gender::Female => "Nữ",
        }
    }

    /// Parse a stored label. Accepts surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Nam" => Some(Gender::Male),
            "Nữ" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Whether a registered patient is still in the waiting list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    #[default]
    Waiting,
    Processed,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Waiting => "waiting",
            PatientStatus::Processed => "processed",
        }
    }

    /// Parse a stored status; anything unknown counts as waiting.
    pub fn parse(s: &str) -> Self {
        match s {
            "processed" => PatientStatus::Processed,
            _ => PatientStatus::Waiting,
        }
    }
}

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Storage-assigned ID
    pub id: String,
    /// Full name
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    /// Ten digits, leading zero
    pub phone_number: String,
    /// Day the patient joined the waiting list (immutable)
    pub registration_date: NaiveDate,
    /// Local wall-clock time of registration, `HH:MM:SS` (immutable)
    pub registration_time: String,
    pub status: PatientStatus,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Age in whole years on the given day.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let dob = self.date_of_birth;
        if today < dob {
            return 0;
        }
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    /// Check if this patient is still waiting to be seen.
    pub fn is_waiting(&self) -> bool {
        self.status == PatientStatus::Waiting
    }

    /// Case-insensitive substring match on name, plain substring on phone.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&term.to_lowercase()) || self.phone_number.contains(term)
    }
}

/// Intake form as filled in by the receptionist. Not yet validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientForm {
    pub name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: String,
    pub phone_number: String,
}

/// A validated patient ready to be stored. Status starts as waiting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub phone_number: String,
    pub registration_date: NaiveDate,
    pub registration_time: String,
}

/// Editable patient fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl PatientUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.date_of_birth.is_none()
            && self.address.is_none()
            && self.phone_number.is_none()
    }
}
