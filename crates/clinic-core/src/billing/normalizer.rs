//! Prescription normalizer.
//!
//! Stored examinations come back as loosely-typed JSON. The medicine list in
//! particular may be missing, may be an object keyed by index instead of an
//! array, and may hold partial or broken entries. Everything that reads
//! prescriptions from storage goes through this normalizer first.
//!
//! Handles:
//! - Shape repair (index-keyed object → ordered list, anything else → empty)
//! - Dropping non-object entries
//! - Field defaults (id, name, unit, quantity, usage)

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::models::{Examination, Medicine, MedicineUnit, DEFAULT_USAGE};

/// Name given to a line item stored without one.
pub const DEFAULT_MEDICINE_NAME: &str = "Unknown Medicine";

/// Quantity given to a line item without a readable one.
pub const DEFAULT_QUANTITY: u32 = 1;

/// Pure, idempotent repair of stored examination records.
#[derive(Debug, Clone)]
pub struct PrescriptionNormalizer {
    default_name: String,
    default_usage: String,
}

impl Default for PrescriptionNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PrescriptionNormalizer {
    /// Create a normalizer with the standard defaults.
    pub fn new() -> Self {
        Self {
            default_name: DEFAULT_MEDICINE_NAME.to_string(),
            default_usage: DEFAULT_USAGE.to_string(),
        }
    }

    /// Normalize a whole examination record.
    pub fn normalize(&self, record: &Value) -> Examination {
        let empty = Map::new();
        let fields = record.as_object().unwrap_or(&empty);

        Examination {
            id: text_field(fields, "id"),
            patient_id: text_field(fields, "patient_id"),
            patient_name: text_field(fields, "patient_name"),
            exam_date: fields.get("exam_date").and_then(parse_date),
            symptoms: text_field(fields, "symptoms"),
            diagnosis: text_field(fields, "diagnosis"),
            medicines: fields
                .get("medicines")
                .map(|value| self.normalize_medicines(value))
                .unwrap_or_default(),
        }
    }

    /// Normalize a stored medicine list into an ordered sequence.
    pub fn normalize_medicines(&self, value: &Value) -> Vec<Medicine> {
        let entries: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            // Index-keyed object from a lossy round trip; keep key order
            Value::Object(map) => map.values().collect(),
            Value::Null => Vec::new(),
            other => {
                tracing::debug!(kind = value_kind(other), "Medicine list has wrong shape; using empty list");
                Vec::new()
            }
        };

        let total = entries.len();
        let medicines: Vec<Medicine> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| self.normalize_medicine(index, entry))
            .collect();

        if medicines.len() < total {
            tracing::debug!(
                dropped = total - medicines.len(),
                kept = medicines.len(),
                "Dropped malformed medicine entries"
            );
        }

        medicines
    }

    /// Normalize one entry; `None` for entries that are not objects.
    fn normalize_medicine(&self, index: usize, entry: &Value) -> Option<Medicine> {
        let fields = entry.as_object()?;

        let id = match fields.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => format!("med_{}", index),
        };

        let name = match fields.get("name") {
            Some(Value::String(s)) => s.clone(),
            _ => self.default_name.clone(),
        };

        let unit = fields
            .get("unit")
            .and_then(Value::as_str)
            .and_then(MedicineUnit::parse)
            .unwrap_or_default();

        let quantity = fields
            .get("quantity")
            .and_then(parse_quantity)
            .unwrap_or(DEFAULT_QUANTITY);

        let usage = match fields.get("usage") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => self.default_usage.clone(),
        };

        Some(Medicine {
            id,
            name,
            unit,
            quantity,
            usage,
        })
    }
}

/// Numeric parse of a stored quantity. Negative values clamp to zero,
/// fractions truncate.
fn parse_quantity(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !number.is_finite() {
        return None;
    }
    if number <= 0.0 {
        return Some(0);
    }
    Some(number.trunc().min(f64::from(u32::MAX)) as u32)
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    // Tolerate full timestamps by reading only the date part
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
