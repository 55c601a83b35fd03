//! Database layer for the clinic core.

mod columns;
mod schema;
mod patients;
mod examinations;
mod invoices;
mod settings;

pub use schema::*;
pub use patients::*;
pub use examinations::*;
pub use invoices::*;
pub use settings::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::billing::PrescriptionNormalizer;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
    normalizer: PrescriptionNormalizer,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> DbResult<Self> {
        let db = Self {
            conn,
            normalizer: PrescriptionNormalizer::new(),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Storage timestamp for `created_at` / `updated_at`.
fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fresh record ID.
fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
