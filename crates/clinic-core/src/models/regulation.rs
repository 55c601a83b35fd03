//! Clinic regulation settings.

use serde::{Deserialize, Serialize};

use super::Vnd;

/// Daily intake limit used when nothing has been configured.
pub const DEFAULT_MAX_PATIENTS_PER_DAY: u32 = 40;

/// Consultation fee used when nothing has been configured.
pub const DEFAULT_CONSULTATION_FEE: Vnd = 150_000;

/// The two tunable clinic settings. Stored as a single record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Regulation {
    pub max_patients_per_day: u32,
    pub consultation_fee: Vnd,
}

impl Default for Regulation {
    fn default() -> Self {
        Self {
            max_patients_per_day: DEFAULT_MAX_PATIENTS_PER_DAY,
            consultation_fee: DEFAULT_CONSULTATION_FEE,
        }
    }
}

impl Regulation {
    /// A zero daily limit or a negative fee is never stored.
    pub fn is_valid(&self) -> bool {
        self.max_patients_per_day > 0 && self.consultation_fee >= 0
    }
}
