//! Local key-value persistence for session data.
//!
//! Values are JSON strings. The session token never goes through here; it
//! lives in a [`weathernow_auth::SecretStore`].

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use weathernow_core::PersistenceError;

/// Key holding the saved location list
pub const LOCATIONS_KEY: &str = "locations";

/// Key holding `{email, locations}` for the logged-in user
pub const USER_KEY: &str = "user";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

fn local_err(e: rusqlite::Error) -> PersistenceError {
    PersistenceError::Local(e.to_string())
}

/// SQLite-backed key-value store.
///
/// A single `kv` table; the connection is opened once and shared behind a mutex.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Local(format!(
                    "Failed to create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path).map_err(local_err)?;
        tracing::debug!("Opened local store at {}", path.display());
        Self::with_connection(conn)
    }

    /// In-memory store, nothing is written to disk.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory().map_err(local_err)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(local_err)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .map_err(local_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(local_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(local_err)
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(local_err)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn
            .lock()
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(local_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(local_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_key() {
        let store = SqliteKvStore::in_memory().unwrap();
        assert_eq!(store.get(LOCATIONS_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let store = SqliteKvStore::in_memory().unwrap();
        store.set(LOCATIONS_KEY, "[]").unwrap();
        store.set(LOCATIONS_KEY, "[1]").unwrap();

        assert_eq!(store.get(LOCATIONS_KEY).unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.keys().unwrap(), vec![LOCATIONS_KEY.to_string()]);
    }

    #[test]
    fn test_remove() {
        let store = SqliteKvStore::in_memory().unwrap();
        store.set(USER_KEY, "{}").unwrap();
        store.remove(USER_KEY).unwrap();
        store.remove(USER_KEY).unwrap();
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("weathernow.db");

        {
            let store = SqliteKvStore::new(&path).unwrap();
            store.set(LOCATIONS_KEY, r#"[{"city":"Reno"}]"#).unwrap();
        }

        let reopened = SqliteKvStore::new(&path).unwrap();
        assert_eq!(
            reopened.get(LOCATIONS_KEY).unwrap().as_deref(),
            Some(r#"[{"city":"Reno"}]"#)
        );
    }
}
