//! `SQLite`-backed local store

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{migrations, LocalStore};
use crate::error::{Error, Result};
use crate::util::unix_millis_now;

/// Durable `LocalStore` keeping every entry in a single `kv_entries` table.
pub struct SqliteLocalStore {
    conn: Mutex<Connection>,
}

impl SqliteLocalStore {
    /// Open a store at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened local store at {}", path.display());
        Self::initialize(conn)
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        Self::configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Configure `SQLite` for a small single-writer workload
    fn configure(conn: &Connection) -> Result<()> {
        // In-memory databases reject WAL; that is fine
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("local store lock poisoned".to_string()))
    }
}

impl LocalStore for SqliteLocalStore {
    fn get_entry(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_entry(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, unix_millis_now()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectionKey;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        assert_eq!(store.get_entry("missing").unwrap(), None);
    }

    #[test]
    fn set_entry_overwrites_existing_value() {
        let store = SqliteLocalStore::open_in_memory().unwrap();
        store.set_entry("k", "one").unwrap();
        store.set_entry("k", "two").unwrap();
        assert_eq!(store.get_entry("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn entries_survive_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("taskflow.db");

        let device_id = {
            let store = SqliteLocalStore::open(&path).unwrap();
            store
                .write(CollectionKey::Jobs, &json!({"job_a_1": {"id": "job_a_1"}}))
                .unwrap();
            store.write_version(CollectionKey::Jobs, 1234).unwrap();
            store.device_id().unwrap()
        };

        let reopened = SqliteLocalStore::open(&path).unwrap();
        assert_eq!(reopened.read_version(CollectionKey::Jobs).unwrap(), 1234);
        assert_eq!(reopened.device_id().unwrap(), device_id);
        assert_eq!(
            reopened.read(CollectionKey::Jobs).unwrap(),
            Some(json!({"job_a_1": {"id": "job_a_1"}}))
        );
    }
}
