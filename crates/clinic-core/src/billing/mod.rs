//! Invoice fee reconciliation.
//!
//! Pipeline: Stored prescription → Normalization → Pricing → Medicine fee → Invoice total

mod draft;
mod normalizer;
mod pricing;

pub use draft::*;
pub use normalizer::*;
pub use pricing::*;

use serde_json::Value;
use thiserror::Error;

use crate::models::{Examination, Medicine, Vnd};

/// Invoice drafting errors.
#[derive(Error, Debug, PartialEq)]
pub enum InvoiceError {
    #[error("Medicine fee is calculated from examination {0} and cannot be edited")]
    MedicineFeeLocked(String),

    #[error("Examination {0} has no exam date")]
    MissingExamDate(String),

    #[error("Fee must not be negative: {0}")]
    NegativeFee(Vnd),
}

pub type InvoiceResult<T> = Result<T, InvoiceError>;

/// Computes medicine fees from prescriptions.
pub struct FeeCalculator {
    normalizer: PrescriptionNormalizer,
    estimator: PriceEstimator,
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeCalculator {
    /// Create a calculator with the built-in price table.
    pub fn new() -> Self {
        Self::with_estimator(PriceEstimator::new())
    }

    /// Create a calculator with a custom price estimator.
    pub fn with_estimator(estimator: PriceEstimator) -> Self {
        Self {
            normalizer: PrescriptionNormalizer::new(),
            estimator,
        }
    }

    /// Cost of one line: estimated unit price times quantity.
    pub fn line_cost(&self, medicine: &Medicine) -> Vnd {
        self.estimator.estimate_medicine(medicine) * Vnd::from(medicine.quantity)
    }

    /// Total medicine fee for a normalized examination.
    pub fn medicine_fee(&self, examination: &Examination) -> Vnd {
        self.medicines_fee(&examination.medicines)
    }

    /// Total fee for a list of line items. Zero for an empty list.
    pub fn medicines_fee(&self, medicines: &[Medicine]) -> Vnd {
        medicines.iter().map(|m| self.line_cost(m)).sum()
    }

    /// Total medicine fee for a stored record that has not been normalized.
    pub fn medicine_fee_raw(&self, record: &Value) -> Vnd {
        let examination = self.normalizer.normalize(record);
        self.medicine_fee(&examination)
    }

    /// Get the estimator for direct access.
    pub fn estimator(&self) -> &PriceEstimator {
        &self.estimator
    }

    /// Get the normalizer for direct access.
    pub fn normalizer(&self) -> &PrescriptionNormalizer {
        &self.normalizer
    }
}
