//! Per-day session aggregation with serialized mutation.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tokio::sync::Mutex;
use vt_core::{BrowsingSession, TabId, Visit, rows_to_csv, visit_rows};
use vt_store::{SessionStore, StoreError};

/// Owns the per-date session documents and the only write path to the store.
///
/// Handlers for different tabs interleave around storage await points, so a
/// naive load-modify-save would let two concurrent upserts read the same
/// stale document and silently drop one visit. Every mutating operation here
/// holds `write_lock` across its whole read-modify-write instead.
pub struct SessionAggregator<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: SessionStore> SessionAggregator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads a day's session, degrading read failures to a fresh document.
    async fn load_or_create(&self, date: NaiveDate) -> BrowsingSession {
        match self.store.load(date).await {
            Ok(Some(session)) => session,
            Ok(None) => BrowsingSession::new(date),
            Err(error) => {
                tracing::warn!(%date, %error, "session load failed, starting fresh");
                BrowsingSession::new(date)
            }
        }
    }

    /// Inserts or replaces (by visit id) one visit in today's session and
    /// recomputes every derived field before persisting.
    pub async fn upsert_visit(&self, visit: Visit, now: DateTime<Utc>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut session = self.load_or_create(now.date_naive()).await;
        let tab = session.tab_or_insert(visit.tab_id, visit.window_id, visit.start_time);
        if let Some(existing) = tab.visits.iter_mut().find(|v| v.id == visit.id) {
            *existing = visit;
        } else {
            tab.visits.push(visit);
        }
        session.recompute();
        self.store.save(&session).await
    }

    /// Stamps `closed_at` on the tab session and force-finalizes any visit in
    /// it still missing an end time, in one persisted operation.
    pub async fn close_tab_session(
        &self,
        tab_id: TabId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut session = self.load_or_create(now.date_naive()).await;
        let Some(tab) = session.tab_mut(tab_id) else {
            return Ok(());
        };
        tab.close(now);
        session.recompute();
        self.store.save(&session).await
    }

    /// Today's session; an empty zeroed one when nothing is persisted yet.
    ///
    /// Sessions written before the unique-count stats existed are healed on
    /// load: the stats are recomputed and persisted back once.
    pub async fn current_session(&self, now: DateTime<Utc>) -> BrowsingSession {
        let date = now.date_naive();
        let mut session = self.load_or_create(date).await;
        if needs_stats_backfill(&session) {
            session.recompute();
            if let Err(error) = self.store.save(&session).await {
                tracing::warn!(%date, %error, "failed to persist backfilled stats");
            }
        }
        session
    }

    /// Persisted sessions for the last `days` days, most recent first.
    /// Days without data are skipped.
    pub async fn session_history(&self, days: u32, now: DateTime<Utc>) -> Vec<BrowsingSession> {
        let today = now.date_naive();
        let mut sessions = Vec::new();
        for offset in 0..days {
            let date = today - TimeDelta::days(i64::from(offset));
            match self.store.load(date).await {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(error) => tracing::warn!(%date, %error, "skipping unreadable day"),
            }
        }
        sessions
    }

    /// Today's flattened chronological visit list.
    pub async fn all_url_visits(&self, now: DateTime<Utc>) -> Vec<Visit> {
        self.current_session(now)
            .await
            .all_visits()
            .into_iter()
            .cloned()
            .collect()
    }

    /// A day's session as a structured export document.
    pub async fn export_session(
        &self,
        date: NaiveDate,
    ) -> Result<Option<BrowsingSession>, StoreError> {
        self.store.load(date).await
    }

    /// A day's session as flattened CSV for download/reporting.
    pub async fn export_csv(&self, date: NaiveDate) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .load(date)
            .await?
            .map(|session| rows_to_csv(&visit_rows(&session))))
    }

    /// Replaces a day's persisted document wholesale (session import).
    pub async fn import_session(&self, session: &BrowsingSession) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.store.save(session).await
    }

    /// Removes sessions older than `days` days. Returns how many were removed.
    pub async fn cleanup_older_than(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let cutoff = now.date_naive() - TimeDelta::days(i64::from(days));
        let mut removed = 0;
        for date in self.store.list_dates().await? {
            if date < cutoff {
                self.store.remove(date).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// A session persisted before the unique counts existed deserializes with
/// them zeroed; visits on record with a zero unique count is the tell.
fn needs_stats_backfill(session: &BrowsingSession) -> bool {
    session.stats.total_urls > 0 && session.stats.unique_urls == 0
}
