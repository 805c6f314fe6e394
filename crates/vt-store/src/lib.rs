//! Storage layer for the visit tracker.
//!
//! Persisted state is a key-value map from `session_<ISO-date>` keys to whole
//! [`BrowsingSession`] JSON documents. The [`SessionStore`] trait is the only
//! surface the engine sees; every method is a genuine suspension point, which
//! is why all session mutation above this layer must be serialized (see the
//! aggregator in `vt-engine`).
//!
//! # Thread Safety
//!
//! [`SqliteStore`] wraps a `rusqlite::Connection` behind a mutex, so a single
//! instance can be shared across tasks. The guard is never held across an
//! await point.
//!
//! # Timestamp Format
//!
//! Timestamps inside the stored documents are ISO 8601 text produced by
//! `chrono::DateTime<Utc>` serialization: lexicographic order matches
//! chronological order and values stay human-readable in the database.

mod memory;
mod sqlite;

use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;
use vt_core::BrowsingSession;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A session document failed to serialize or deserialize.
    #[error("invalid session document for {key}: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The connection mutex was poisoned by a panicking writer.
    #[error("storage mutex poisoned")]
    Poisoned,
    /// The backend rejected the call (transient I/O failure).
    #[error("storage unavailable")]
    Unavailable,
}

/// A persistent key-value store of per-date browsing sessions.
///
/// Methods return `impl Future + Send` so engine tasks built over a generic
/// store can still be spawned onto the runtime.
pub trait SessionStore: Send + Sync {
    /// Loads the session persisted for `date`, if any.
    fn load(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<BrowsingSession>, StoreError>> + Send;

    /// Persists a whole session document under its date key.
    fn save(&self, session: &BrowsingSession) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Enumerates every date with a persisted session.
    fn list_dates(&self) -> impl Future<Output = Result<Vec<NaiveDate>, StoreError>> + Send;

    /// Removes the session persisted for `date`. Missing keys are not an error.
    fn remove(&self, date: NaiveDate) -> impl Future<Output = Result<(), StoreError>> + Send;
}
