//! SQLite storage backend
//!
//! Persists the address cache into a single `addresses` table; the
//! nickname history is stored as a JSON array column. Every save replaces
//! the previous snapshot inside one transaction.

use std::path::Path;
use std::sync::Mutex;

use gateguard_core::{AddressRecord, GuardError, Result, StorageBackend};
use log::debug;
use rusqlite::{params, Connection};

pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS addresses (
    address     TEXT PRIMARY KEY,
    blacklisted INTEGER NOT NULL DEFAULT 0,
    whitelisted INTEGER NOT NULL DEFAULT 0,
    nicknames   TEXT NOT NULL DEFAULT '[]'
)";

impl SqliteBackend {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path).map_err(storage_err)?)
    }

    /// In-memory database, for tests.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(storage_err)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).map_err(storage_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl StorageBackend for SqliteBackend {
    fn load(&self) -> Result<Vec<AddressRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT address, blacklisted, whitelisted, nicknames FROM addresses")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                let nicknames: String = row.get(3)?;
                Ok(AddressRecord {
                    address: row.get(0)?,
                    blacklisted: row.get(1)?,
                    whitelisted: row.get(2)?,
                    nicknames: serde_json::from_str(&nicknames).unwrap_or_default(),
                })
            })
            .map_err(storage_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(storage_err)?);
        }
        debug!("Loaded {} rows from SQLite", records.len());
        Ok(records)
    }

    fn save(&self, records: &[AddressRecord]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(storage_err)?;
        tx.execute("DELETE FROM addresses", []).map_err(storage_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO addresses (address, blacklisted, whitelisted, nicknames)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(storage_err)?;
            for record in records {
                let nicknames = serde_json::to_string(&record.nicknames)
                    .map_err(|e| GuardError::Storage(e.to_string()))?;
                stmt.execute(params![
                    record.address,
                    record.blacklisted,
                    record.whitelisted,
                    nicknames
                ])
                .map_err(storage_err)?;
            }
        }
        tx.commit().map_err(storage_err)?;
        debug!("Saved {} rows to SQLite", records.len());
        Ok(())
    }
}

fn storage_err(e: rusqlite::Error) -> GuardError {
    GuardError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(address: &str) -> AddressRecord {
        AddressRecord {
            address: address.to_string(),
            blacklisted: true,
            whitelisted: false,
            nicknames: vec!["Steve".to_string(), "Alex".to_string()],
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let backend = SqliteBackend::in_memory().unwrap();
        let records = vec![record("203.0.113.5"), record("198.51.100.7")];
        backend.save(&records).unwrap();

        let mut loaded = backend.load().unwrap();
        loaded.sort_by(|a, b| a.address.cmp(&b.address));
        let mut expected = records;
        expected.sort_by(|a, b| a.address.cmp(&b.address));
        assert_eq!(loaded, expected);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.save(&[record("203.0.113.5")]).unwrap();
        backend.save(&[record("198.51.100.7")]).unwrap();

        let loaded = backend.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].address, "198.51.100.7");
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guard.db");
        {
            let backend = SqliteBackend::open(&path).unwrap();
            backend.save(&[record("203.0.113.5")]).unwrap();
        }
        let backend = SqliteBackend::open(&path).unwrap();
        let loaded = backend.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].blacklisted);
    }
}
