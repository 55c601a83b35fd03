//! Medicine price estimation.
//!
//! Lookup order:
//! 1. Exact (case-insensitive, trimmed) name match against the reference table
//! 2. Substring match in either direction, in table order
//! 3. Fallback price for the dispensing unit

use serde::{Deserialize, Serialize};

use crate::models::{Medicine, MedicineUnit, Vnd};

/// Price for an unknown unit, and for "Viên".
pub const DEFAULT_UNIT_PRICE: Vnd = 10_000;

/// Reference unit prices, in lookup order.
const REFERENCE_PRICES: [(&str, Vnd); 10] = [
    ("Paracetamol", 5_000),
    ("Amoxicillin", 15_000),
    ("Cetirizine", 8_000),
    ("Omeprazole", 12_000),
    ("Vitamin C", 3_000),
    ("Ibuprofen", 7_000),
    ("Loratadine", 6_000),
    ("Azithromycin", 25_000),
    ("Metformin", 4_000),
    ("Salbutamol", 30_000),
];

/// Which rule produced a price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceSource {
    /// Name equals a reference entry
    Exact { reference: String },
    /// Name contains, or is contained in, a reference entry
    Partial { reference: String },
    /// No name match; priced by unit
    UnitFallback,
}

/// An estimated unit price with its provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub unit_price: Vnd,
    pub source: PriceSource,
}

#[derive(Debug, Clone)]
struct ReferencePrice {
    name: String,
    key: String,
    price: Vnd,
}

/// Estimates unit prices from a fixed, ordered reference table.
#[derive(Debug, Clone)]
pub struct PriceEstimator {
    table: Vec<ReferencePrice>,
}

impl Default for PriceEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceEstimator {
    /// Create an estimator with the built-in reference table.
    pub fn new() -> Self {
        Self::with_table(REFERENCE_PRICES)
    }

    /// Create an estimator from a custom table. Order is lookup order.
    pub fn with_table<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vnd)>,
        S: Into<String>,
    {
        let mut estimator = Self { table: Vec::new() };
        for (name, price) in entries {
            estimator.add_reference_price(name, price);
        }
        estimator
    }

    /// Add a reference price, replacing an existing entry with the same name
    /// in place. Blank names are ignored.
    pub fn add_reference_price(&mut self, name: impl Into<String>, price: Vnd) {
        let name = name.into();
        let key = normalize_name(&name);
        if key.is_empty() {
            return;
        }

        match self.table.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => {
                entry.name = name;
                entry.price = price;
            }
            None => self.table.push(ReferencePrice { name, key, price }),
        }
    }

    /// Number of reference entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Estimated unit price in VND. Never fails.
    pub fn estimate(&self, name: &str, unit: &str) -> Vnd {
        self.quote(name, unit).unit_price
    }

    /// Estimated unit price for a prescription line.
    pub fn estimate_medicine(&self, medicine: &Medicine) -> Vnd {
        self.estimate(&medicine.name, medicine.unit.as_str())
    }

    /// Estimated unit price and the rule that produced it.
    pub fn quote(&self, name: &str, unit: &str) -> PriceQuote {
        let query = normalize_name(name);

        if !query.is_empty() {
            if let Some(entry) = self.table.iter().find(|entry| entry.key == query) {
                return PriceQuote {
                    unit_price: entry.price,
                    source: PriceSource::Exact {
                        reference: entry.name.clone(),
                    },
                };
            }

            if let Some(entry) = self
                .table
                .iter()
                .find(|entry| entry.key.contains(&query) || query.contains(&entry.key))
            {
                return PriceQuote {
                    unit_price: entry.price,
                    source: PriceSource::Partial {
                        reference: entry.name.clone(),
                    },
                };
            }
        }

        PriceQuote {
            unit_price: unit_fallback_price(unit),
            source: PriceSource::UnitFallback,
        }
    }
}

/// Fallback unit price keyed by dispensing unit.
pub fn unit_fallback_price(unit: &str) -> Vnd {
    match MedicineUnit::parse(unit) {
        Some(MedicineUnit::Vien) => 10_000,
        Some(MedicineUnit::Ong) => 15_000,
        Some(MedicineUnit::Chai) => 25_000,
        Some(MedicineUnit::Goi) => 8_000,
        Some(MedicineUnit::Vi) => 20_000,
        None => DEFAULT_UNIT_PRICE,
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_ignores_case_and_whitespace() {
        let estimator = PriceEstimator::new();
        assert_eq!(estimator.estimate("Paracetamol", "Viên"), 5_000);
        assert_eq!(estimator.estimate("paracetamol ", "Viên"), 5_000);
        assert_eq!(estimator.estimate("  AMOXICILLIN", "Chai"), 15_000);
    }

    #[test]
    fn test_partial_match_both_directions() {
        let estimator = PriceEstimator::new();

        // Reference name inside input
        let quote = estimator.quote("Paracetamol Extra", "Viên");
        assert_eq!(quote.unit_price, 5_000);
        assert_eq!(
            quote.source,
            PriceSource::Partial {
                reference: "Paracetamol".into()
            }
        );

        // Input inside reference name
        assert_eq!(estimator.estimate("amoxi", "Viên"), 15_000);
    }

    #[test]
    fn test_partial_match_uses_table_order() {
        let estimator = PriceEstimator::with_table([("Alpha Beta", 1_000), ("Beta", 2_000)]);
        assert_eq!(estimator.estimate("Beta Gamma", "Viên"), 2_000);
        // Both entries contain "eta"; the first one wins
        assert_eq!(estimator.estimate("eta", "Viên"), 1_000);
    }

    #[test]
    fn test_unit_fallback() {
        let estimator = PriceEstimator::new();
        assert_eq!(estimator.estimate("Unknown Drug X", "Chai"), 25_000);
        assert_eq!(estimator.estimate("", "Gói"), 8_000);
        assert_eq!(estimator.estimate("   ", "Ống"), 15_000);
        assert_eq!(estimator.estimate("Unknown Drug X", "Vỉ"), 20_000);
        assert_eq!(estimator.estimate("Unknown Drug X", "Viên"), 10_000);
        assert_eq!(estimator.estimate("Unknown Drug X", "Hộp"), DEFAULT_UNIT_PRICE);
        assert_eq!(estimator.quote("", "Chai").source, PriceSource::UnitFallback);
    }

    #[test]
    fn test_add_reference_price_replaces_in_place() {
        let mut estimator = PriceEstimator::new();
        let before = estimator.len();

        estimator.add_reference_price("paracetamol", 6_000);
        assert_eq!(estimator.len(), before);
        assert_eq!(estimator.estimate("Paracetamol", "Viên"), 6_000);

        estimator.add_reference_price("Berberin", 2_000);
        assert_eq!(estimator.len(), before + 1);
        assert_eq!(estimator.estimate("berberin", "Viên"), 2_000);

        estimator.add_reference_price("  ", 1);
        assert_eq!(estimator.len(), before + 1);
    }

    #[test]
    fn test_estimate_medicine_uses_line_unit() {
        let estimator = PriceEstimator::new();
        let med = Medicine::new("Siro ho", MedicineUnit::Chai, 1);
        assert_eq!(estimator.estimate_medicine(&med), 25_000);
    }
}
