//! Clinic configuration.
//!
//! Loaded from a TOML file. Every key is optional; missing keys take the
//! built-in defaults.
//!
//! ```toml
//! default_consultation_fee = 150000
//! default_max_patients_per_day = 40
//! payment_methods = ["Tiền mặt", "Chuyển khoản", "Thẻ tín dụng"]
//! default_medicine_quantity = 10
//! database_path = "clinic.db"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Vnd, DEFAULT_CONSULTATION_FEE, DEFAULT_MAX_PATIENTS_PER_DAY};

/// Quantity pre-filled on a new prescription line.
pub const DEFAULT_MEDICINE_QUANTITY: u32 = 10;

/// Payment methods accepted at the front desk.
pub const DEFAULT_PAYMENT_METHODS: [&str; 3] = ["Tiền mặt", "Chuyển khoản", "Thẻ tín dụng"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    /// Consultation fee used while regulations are loading
    pub default_consultation_fee: Vnd,
    /// Daily intake limit used while regulations are loading
    pub default_max_patients_per_day: u32,
    pub payment_methods: Vec<String>,
    pub default_medicine_quantity: u32,
    pub database_path: PathBuf,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            default_consultation_fee: DEFAULT_CONSULTATION_FEE,
            default_max_patients_per_day: DEFAULT_MAX_PATIENTS_PER_DAY,
            payment_methods: DEFAULT_PAYMENT_METHODS.iter().map(|m| m.to_string()).collect(),
            default_medicine_quantity: DEFAULT_MEDICINE_QUANTITY,
            database_path: PathBuf::from("clinic.db"),
        }
    }
}

impl ClinicConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read clinic config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load clinic config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ClinicConfig =
            toml::from_str(content).context("Failed to parse clinic config")?;
        Ok(config)
    }

    /// Check if a payment method is one the clinic accepts.
    pub fn accepts_payment_method(&self, method: &str) -> bool {
        self.payment_methods.iter().any(|m| m == method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClinicConfig::default();
        assert_eq!(config.default_consultation_fee, 150_000);
        assert_eq!(config.default_max_patients_per_day, 40);
        assert_eq!(config.default_medicine_quantity, 10);
        assert_eq!(config.payment_methods.len(), 3);
        assert!(config.accepts_payment_method("Chuyển khoản"));
        assert!(!config.accepts_payment_method("Bitcoin"));
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = ClinicConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClinicConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides_given_keys() {
        let config = ClinicConfig::from_toml_str(
            r#"
            default_consultation_fee = 200000
            payment_methods = ["Tiền mặt"]
            "#,
        )
        .unwrap();

        assert_eq!(config.default_consultation_fee, 200_000);
        assert_eq!(config.payment_methods, vec!["Tiền mặt".to_string()]);
        assert_eq!(config.default_max_patients_per_day, 40);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(ClinicConfig::from_toml_str("default_consultation_fee = \"free\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_max_patients_per_day = 25").unwrap();
        writeln!(file, "database_path = \"/var/lib/clinic/clinic.db\"").unwrap();

        let config = ClinicConfig::load(file.path()).unwrap();
        assert_eq!(config.default_max_patients_per_day, 25);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/clinic/clinic.db"));
    }

    #[test]
    fn test_load_missing_file_mentions_path() {
        let err = ClinicConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("/definitely/not/here.toml"));
    }
}
