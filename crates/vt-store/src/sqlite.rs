//! SQLite-backed session store.

use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use vt_core::{BrowsingSession, parse_storage_key, storage_key};

use crate::{SessionStore, StoreError};

/// Session store backed by a single SQLite database.
///
/// Sessions are stored as whole JSON documents in one `sessions` table; the
/// key column carries the `session_<ISO-date>` form so plain SQL queries stay
/// readable and key enumeration is a single scan.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens a store at the given path, creating the schema if necessary.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens an in-memory store. Useful for tests; data is lost on drop.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                key  TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    #[cfg(test)]
    fn insert_raw(&self, key: &str, data: &str) {
        self.lock()
            .unwrap()
            .execute(
                "INSERT OR REPLACE INTO sessions (key, data) VALUES (?1, ?2)",
                params![key, data],
            )
            .unwrap();
    }
}

impl SessionStore for SqliteStore {
    async fn load(&self, date: NaiveDate) -> Result<Option<BrowsingSession>, StoreError> {
        let key = storage_key(date);
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM sessions WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        drop(conn);
        data.map(|data| {
            serde_json::from_str(&data).map_err(|source| StoreError::Serde { key, source })
        })
        .transpose()
    }

    async fn save(&self, session: &BrowsingSession) -> Result<(), StoreError> {
        let key = session.storage_key();
        let data = serde_json::to_string(session).map_err(|source| StoreError::Serde {
            key: key.clone(),
            source,
        })?;
        self.lock()?.execute(
            "INSERT INTO sessions (key, data) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data",
            params![key, data],
        )?;
        Ok(())
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM sessions ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut dates = Vec::with_capacity(keys.len());
        for key in keys {
            match parse_storage_key(&key) {
                Some(date) => dates.push(date),
                None => tracing::warn!(key, "skipping unparseable session key"),
            }
        }
        Ok(dates)
    }

    async fn remove(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.lock()?.execute(
            "DELETE FROM sessions WHERE key = ?1",
            params![storage_key(date)],
        )?;
        Ok(())
    }
}
