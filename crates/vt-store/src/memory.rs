//! In-memory session store for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use vt_core::{BrowsingSession, parse_storage_key, storage_key};

use crate::{SessionStore, StoreError};

/// In-memory store that behaves like a real asynchronous backend.
///
/// Every operation yields to the scheduler before touching the map, so the
/// read-modify-write races the aggregator guards against are actually
/// observable in tests. Documents round-trip through JSON to keep the
/// serialization boundary honest. Failure toggles simulate transient I/O
/// errors.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent loads fail with [`StoreError::Unavailable`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent saves fail with [`StoreError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of persisted documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every persisted document.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl SessionStore for MemoryStore {
    async fn load(&self, date: NaiveDate) -> Result<Option<BrowsingSession>, StoreError> {
        tokio::task::yield_now().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        let key = storage_key(date);
        let data = {
            let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
            entries.get(&key).cloned()
        };
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
        tokio::task::yield_now().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        self.entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(key, data);
        Ok(())
    }

    async fn list_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        tokio::task::yield_now().await;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let mut dates: Vec<NaiveDate> = entries.keys().filter_map(|k| parse_storage_key(k)).collect();
        drop(entries);
        dates.sort_unstable();
        Ok(dates)
    }

    async fn remove(&self, date: NaiveDate) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        self.entries
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .remove(&storage_key(date));
        Ok(())
    }
}
