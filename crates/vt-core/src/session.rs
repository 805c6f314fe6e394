//! Per-tab and per-day aggregates with derived statistics.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::types::{TabId, WindowId};
use crate::visit::Visit;

/// Prefix for persisted session keys.
pub const SESSION_KEY_PREFIX: &str = "session_";

/// Storage key of the form `session_<ISO-date>`.
#[must_use]
pub fn storage_key(date: NaiveDate) -> String {
    format!("{SESSION_KEY_PREFIX}{date}")
}

/// Parses a `session_<ISO-date>` key back into a date.
#[must_use]
pub fn parse_storage_key(key: &str) -> Option<NaiveDate> {
    key.strip_prefix(SESSION_KEY_PREFIX)?.parse().ok()
}

/// All visits recorded for one tab within one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSession {
    pub tab_id: TabId,
    pub window_id: WindowId,
    pub opened_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Sum of contained visits' active time. Derived; kept in sync by
    /// [`Self::recompute_active_time`].
    #[serde(default)]
    pub active_time_ms: i64,
    /// Insertion order is chronological.
    pub visits: Vec<Visit>,
}

impl TabSession {
    #[must_use]
    pub const fn new(tab_id: TabId, window_id: WindowId, opened_at: DateTime<Utc>) -> Self {
        Self {
            tab_id,
            window_id,
            opened_at,
            closed_at: None,
            active_time_ms: 0,
            visits: Vec::new(),
        }
    }

    /// Recomputes the cumulative active time from the visit list.
    pub fn recompute_active_time(&mut self) {
        self.active_time_ms = self.visits.iter().map(|v| v.active_time_ms).sum();
    }

    /// Stamps `closed_at` and force-finalizes any visit still missing an end.
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.closed_at = Some(now);
        for visit in &mut self.visits {
            if !visit.is_finalized() {
                visit.finalize(now);
            }
        }
        self.recompute_active_time();
    }
}

/// Derived statistics over a day's visits.
///
/// A pure function of the visit lists: always recomputed from scratch, never
/// incrementally patched. The unique counts default to zero so sessions
/// persisted before those fields existed still deserialize; the aggregator
/// backfills them on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionStats {
    pub total_urls: usize,
    #[serde(default)]
    pub unique_urls: usize,
    #[serde(default)]
    pub unique_domains: usize,
    pub work_time_ms: i64,
    pub social_time_ms: i64,
    pub other_time_ms: i64,
    pub total_time_ms: i64,
}

impl SessionStats {
    /// Computes stats from a flattened visit list.
    #[must_use]
    pub fn compute<'a, I>(visits: I) -> Self
    where
        I: IntoIterator<Item = &'a Visit>,
    {
        let mut stats = Self::default();
        let mut urls = HashSet::new();
        let mut domains = HashSet::new();
        for visit in visits {
            stats.total_urls += 1;
            urls.insert(visit.url.as_str());
            domains.insert(visit.domain.as_str());
            match visit.category {
                Category::Work => stats.work_time_ms += visit.active_time_ms,
                Category::Social => stats.social_time_ms += visit.active_time_ms,
                Category::Other => stats.other_time_ms += visit.active_time_ms,
            }
            stats.total_time_ms += visit.active_time_ms;
        }
        stats.unique_urls = urls.len();
        stats.unique_domains = domains.len();
        stats
    }
}

/// All activity for one calendar date (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowsingSession {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub tabs: Vec<TabSession>,
    #[serde(default)]
    pub stats: SessionStats,
}

impl BrowsingSession {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            start_time: None,
            end_time: None,
            tabs: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    /// Storage key of the form `session_<ISO-date>`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        storage_key(self.date)
    }

    #[must_use]
    pub fn tab(&self, tab_id: TabId) -> Option<&TabSession> {
        self.tabs.iter().find(|t| t.tab_id == tab_id)
    }

    pub fn tab_mut(&mut self, tab_id: TabId) -> Option<&mut TabSession> {
        self.tabs.iter_mut().find(|t| t.tab_id == tab_id)
    }

    /// Finds the tab session or appends a fresh one.
    pub fn tab_or_insert(
        &mut self,
        tab_id: TabId,
        window_id: WindowId,
        opened_at: DateTime<Utc>,
    ) -> &mut TabSession {
        let index = self
            .tabs
            .iter()
            .position(|t| t.tab_id == tab_id)
            .unwrap_or_else(|| {
                self.tabs.push(TabSession::new(tab_id, window_id, opened_at));
                self.tabs.len() - 1
            });
        &mut self.tabs[index]
    }

    /// Flattened visit list, chronological by start time.
    #[must_use]
    pub fn all_visits(&self) -> Vec<&Visit> {
        let mut visits: Vec<&Visit> = self.tabs.iter().flat_map(|t| t.visits.iter()).collect();
        visits.sort_by_key(|v| v.start_time);
        visits
    }

    /// Recomputes every derived field from the visit lists: per-tab cumulative
    /// active time, the session boundaries and the statistics.
    pub fn recompute(&mut self) {
        for tab in &mut self.tabs {
            tab.recompute_active_time();
        }
        let visits: Vec<&Visit> = self.tabs.iter().flat_map(|t| t.visits.iter()).collect();
        self.start_time = visits.iter().map(|v| v.start_time).min();
        self.end_time = visits.iter().filter_map(|v| v.end_time).max();
        self.stats = SessionStats::compute(visits.iter().copied());
    }
}
