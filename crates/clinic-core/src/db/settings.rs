//! Settings key/value storage.

use rusqlite::{params, OptionalExtension};

use super::{now_timestamp, Database, DbResult};
use crate::models::Regulation;

/// Key of the regulation record in the settings table.
pub const REGULATIONS_KEY: &str = "regulations";

impl Database {
    /// Read the stored regulation, if any.
    pub fn read_regulation(&self) -> DbResult<Option<Regulation>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [REGULATIONS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Overwrite the stored regulation wholesale.
    pub fn write_regulation(&self, regulation: &Regulation) -> DbResult<()> {
        let json = serde_json::to_string(regulation)?;
        self.conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![REGULATIONS_KEY, json, now_timestamp()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_regulation_reads_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.read_regulation().unwrap().is_none());
    }

    #[test]
    fn test_write_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.write_regulation(&Regulation::default()).unwrap();

        let updated = Regulation {
            max_patients_per_day: 25,
            consultation_fee: 200_000,
        };
        db.write_regulation(&updated).unwrap();

        assert_eq!(db.read_regulation().unwrap(), Some(updated));

        let rows: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_corrupt_value_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, 'garbage', '')",
                [REGULATIONS_KEY],
            )
            .unwrap();

        assert!(db.read_regulation().is_err());
    }
}
