//! Medicine usage table.

use serde::{Deserialize, Serialize};

use super::percentage_of;
use crate::models::{Examination, MedicineUnit};

/// One medicine row of the usage table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineUsage {
    /// Line-item ID the row was grouped by
    pub id: String,
    pub name: String,
    pub unit: MedicineUnit,
    /// Units prescribed in total
    pub quantity: u64,
    /// Prescription lines that contributed
    pub usage_count: u32,
    /// Share of all prescribed units, whole percent
    pub percentage: i64,
}

/// Aggregate prescription lines, most-prescribed first.
///
/// Lines are grouped by line-item ID, not by name. A later line with a
/// non-empty name overwrites the row's name. Rows left without a name are
/// dropped. Ties keep first-seen order.
pub fn build_medicine_usage_report(examinations: &[Examination]) -> Vec<MedicineUsage> {
    let mut rows: Vec<MedicineUsage> = Vec::new();

    for medicine in examinations.iter().flat_map(|e| e.medicines.iter()) {
        match rows.iter_mut().find(|row| row.id == medicine.id) {
            Some(row) => {
                row.quantity += u64::from(medicine.quantity);
                row.usage_count += 1;
                if !medicine.name.is_empty() {
                    row.name = medicine.name.clone();
                }
                row.unit = medicine.unit;
            }
            None => rows.push(MedicineUsage {
                id: medicine.id.clone(),
                name: medicine.name.clone(),
                unit: medicine.unit,
                quantity: u64::from(medicine.quantity),
                usage_count: 1,
                percentage: 0,
            }),
        }
    }

    rows.retain(|row| !row.name.is_empty());

    let total: u64 = rows.iter().map(|r| r.quantity).sum();
    for row in &mut rows {
        row.percentage = percentage_of(row.quantity as i64, total as i64);
    }

    // Stable sort keeps first-seen order on ties
    rows.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    rows
}
