//! Invoice models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Vnd;

/// Sum of the three fee components. No rounding beyond whole VND.
pub fn invoice_total(consultation_fee: Vnd, medicine_fee: Vnd, other_fees: Vnd) -> Vnd {
    consultation_fee + medicine_fee + other_fees
}

/// A stored invoice.
///
/// `total_amount` is fixed when the invoice is built and is not re-checked
/// against the fee components afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    /// Storage-assigned ID
    pub id: String,
    pub patient_id: String,
    /// Snapshot of the patient name at billing time
    pub patient_name: String,
    pub exam_date: NaiveDate,
    pub consultation_fee: Vnd,
    pub medicine_fee: Vnd,
    pub other_fees: Vnd,
    pub total_amount: Vnd,
    pub is_paid: bool,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
}

impl Invoice {
    /// Recompute the total from the fee components.
    pub fn computed_total(&self) -> Vnd {
        invoice_total(self.consultation_fee, self.medicine_fee, self.other_fees)
    }
}

/// Invoice data before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInvoice {
    pub patient_id: String,
    pub patient_name: String,
    pub exam_date: NaiveDate,
    pub consultation_fee: Vnd,
    pub medicine_fee: Vnd,
    pub other_fees: Vnd,
    pub total_amount: Vnd,
}

impl NewInvoice {
    /// Build an unpaid invoice; the total is derived from the fees.
    pub fn new(
        patient_id: String,
        patient_name: String,
        exam_date: NaiveDate,
        consultation_fee: Vnd,
        medicine_fee: Vnd,
        other_fees: Vnd,
    ) -> Self {
        Self {
            patient_id,
            patient_name,
            exam_date,
            consultation_fee,
            medicine_fee,
            other_fees,
            total_amount: invoice_total(consultation_fee, medicine_fee, other_fees),
        }
    }
}
