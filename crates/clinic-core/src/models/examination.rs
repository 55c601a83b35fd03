//! Examination and prescription line-item models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default usage text for a line item without instructions.
pub const DEFAULT_USAGE: &str = "Theo chỉ dẫn";

/// Dispensing unit vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MedicineUnit {
    /// Tablet
    #[default]
    #[serde(rename = "Viên")]
    Vien,
    /// Ampoule
    #[serde(rename = "Ống")]
    Ong,
    /// Bottle
    #[serde(rename = "Chai")]
    Chai,
    /// Sachet
    #[serde(rename = "Gói")]
    Goi,
    /// Blister strip
    #[serde(rename = "Vỉ")]
    Vi,
}

impl MedicineUnit {
    pub const ALL: [MedicineUnit; 5] = [
        MedicineUnit::Vien,
        MedicineUnit::Ong,
        MedicineUnit::Chai,
        MedicineUnit::Goi,
        MedicineUnit::Vi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MedicineUnit::Vien => "Viên",
            MedicineUnit::Ong => "Ống",
            MedicineUnit::Chai => "Chai",
            MedicineUnit::Goi => "Gói",
            MedicineUnit::Vi => "Vỉ",
        }
    }

    /// Parse a unit label, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str().to_lowercase() == wanted)
    }
}

impl std::fmt::Display for MedicineUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single prescription line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    /// Client-generated line ID
    pub id: String,
    pub name: String,
    pub unit: MedicineUnit,
    pub quantity: u32,
    /// Dosage instructions
    pub usage: String,
}

impl Medicine {
    /// Create a line item with a fresh client-side ID.
    pub fn new(name: impl Into<String>, unit: MedicineUnit, quantity: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            unit,
            quantity,
            usage: DEFAULT_USAGE.to_string(),
        }
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }
}

/// A recorded visit.
///
/// `patient_name` is a snapshot taken when the visit was recorded. It is not
/// kept in sync with the patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Examination {
    /// Storage-assigned ID
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    /// `None` only when a stored record carries an unreadable date
    pub exam_date: Option<NaiveDate>,
    pub symptoms: String,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
}

impl Examination {
    /// Total units prescribed across all line items.
    pub fn total_quantity(&self) -> u64 {
        self.medicines.iter().map(|m| u64::from(m.quantity)).sum()
    }
}

/// Examination form data before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewExamination {
    pub patient_id: String,
    pub patient_name: String,
    pub exam_date: NaiveDate,
    pub symptoms: String,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
}
