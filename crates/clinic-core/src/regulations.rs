//! Regulation store and in-process cache.
//!
//! The store reads and writes the single regulation record. It never fails
//! a read: a missing record is created with defaults, and a read error falls
//! back to the defaults with a warning.
//!
//! The cache holds the last value read so intake and billing do not hit the
//! database on every form. It starts out `Loading` and only changes on an
//! explicit `refresh`.

use serde::{Deserialize, Serialize};

use crate::config::ClinicConfig;
use crate::db::Database;
use crate::models::{Regulation, Vnd};

/// Reads and writes the regulation record.
pub struct RegulationStore<'a> {
    db: &'a Database,
}

impl<'a> RegulationStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Current regulation, creating the default record on first read.
    pub fn get(&self) -> Regulation {
        match self.db.read_regulation() {
            Ok(Some(regulation)) => regulation,
            Ok(None) => {
                let defaults = Regulation::default();
                if let Err(e) = self.db.write_regulation(&defaults) {
                    tracing::warn!(error = %e, "Failed to persist default regulations");
                }
                defaults
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read regulations; using defaults");
                Regulation::default()
            }
        }
    }

    /// Replace the regulation record. Returns `false` for invalid values or
    /// when the write fails.
    pub fn update(&self, regulation: Regulation) -> bool {
        if !regulation.is_valid() {
            tracing::warn!(
                max_patients_per_day = regulation.max_patients_per_day,
                consultation_fee = regulation.consultation_fee,
                "Rejected invalid regulations"
            );
            return false;
        }

        match self.db.write_regulation(&regulation) {
            Ok(()) => {
                tracing::info!(
                    max_patients_per_day = regulation.max_patients_per_day,
                    consultation_fee = regulation.consultation_fee,
                    "Regulations updated"
                );
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to write regulations");
                false
            }
        }
    }
}

/// Cache state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CacheState {
    /// No successful read yet; accessors return fallbacks
    Loading,
    Loaded(Regulation),
}

/// Process-wide copy of the regulations with per-field fallbacks.
#[derive(Debug, Clone)]
pub struct RegulationCache {
    state: CacheState,
    fallback: Regulation,
}

impl Default for RegulationCache {
    fn default() -> Self {
        Self {
            state: CacheState::Loading,
            fallback: Regulation::default(),
        }
    }
}

impl RegulationCache {
    /// Empty cache whose fallbacks come from the configuration.
    pub fn new(config: &ClinicConfig) -> Self {
        Self {
            state: CacheState::Loading,
            fallback: Regulation {
                max_patients_per_day: config.default_max_patients_per_day,
                consultation_fee: config.default_consultation_fee,
            },
        }
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == CacheState::Loading
    }

    /// Re-read from the store and replace the cached value.
    pub fn refresh(&mut self, store: &RegulationStore<'_>) -> Regulation {
        let regulation = store.get();
        self.state = CacheState::Loaded(regulation);
        regulation
    }

    /// Cached regulation, or the fallbacks while loading.
    pub fn current(&self) -> Regulation {
        match self.state {
            CacheState::Loaded(regulation) => regulation,
            CacheState::Loading => self.fallback,
        }
    }

    pub fn consultation_fee(&self) -> Vnd {
        self.current().consultation_fee
    }

    pub fn max_patients_per_day(&self) -> u32 {
        self.current().max_patients_per_day
    }
}
