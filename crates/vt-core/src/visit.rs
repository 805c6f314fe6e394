//! Visit records and their lifecycle.
//!
//! A [`Visit`] is one continuous period a URL occupied a specific tab. It is
//! created when the tab finishes loading the URL, mutated in place while the
//! user stays on the page (active-time flushes, title updates) and finalized
//! when the tab navigates away or closes. Once finalized it is immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryLists};
use crate::domain::DomainName;
use crate::types::{TabId, VisitId, WindowId};

/// How a visit's page was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreationMode {
    /// Navigation continued within the same tab.
    #[default]
    Chain,
    /// A link on another page opened this tab.
    Hyperlink,
}

impl CreationMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chain => "chain",
            Self::Hyperlink => "hyperlink",
        }
    }
}

impl std::fmt::Display for CreationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The prior visit that led to a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub visit_id: VisitId,
    pub url: String,
    pub tab_id: TabId,
}

/// Inputs to the visit factory.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub url: String,
    pub tab_id: TabId,
    pub window_id: WindowId,
    pub title: Option<String>,
    pub source: Option<SourceInfo>,
    pub creation_mode: CreationMode,
    /// Whether the page is foregrounded and the user is active right now.
    pub is_active: bool,
}

/// One continuous period a URL occupied a specific tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub url: String,
    /// Lowercased hostname with a leading `www.` stripped.
    pub domain: String,
    /// True when the domain came from the heuristic fallback rather than a
    /// parsed URL.
    #[serde(default)]
    pub domain_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Category,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// End minus start in milliseconds, set once finalized.
    #[serde(default)]
    pub duration_ms: i64,
    /// Foregrounded, non-idle time in milliseconds. Monotone non-decreasing;
    /// clamped to `duration_ms` at finalization.
    #[serde(default)]
    pub active_time_ms: i64,
    /// Watermark for active-time deltas: every flush adds exactly
    /// `now - last_active_at` and advances this.
    pub last_active_at: DateTime<Utc>,
    pub tab_id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceInfo>,
    #[serde(default)]
    pub creation_mode: CreationMode,
}

impl Visit {
    /// Builds a visit starting at `now`.
    ///
    /// Infallible by design: domain extraction falls back to a heuristic
    /// slice of the raw URL and classification defaults to `Other`.
    #[must_use]
    pub fn begin(new: NewVisit, lists: &CategoryLists, now: DateTime<Utc>) -> Self {
        let domain = DomainName::extract(&new.url);
        let category = lists.classify(domain.as_str());
        let domain_fallback = domain.is_fallback();
        Self {
            id: VisitId::new(new.tab_id, now.timestamp_millis()),
            url: new.url,
            domain: domain.into_string(),
            domain_fallback,
            title: new.title,
            category,
            start_time: now,
            end_time: None,
            duration_ms: 0,
            active_time_ms: 0,
            last_active_at: now,
            tab_id: new.tab_id,
            window_id: new.window_id,
            is_active: new.is_active,
            source: new.source,
            creation_mode: new.creation_mode,
        }
    }

    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    /// Adds the elapsed time since the watermark and advances it.
    ///
    /// No-op unless the visit is live and active, so active time only grows
    /// while `is_active` holds and each wall-clock interval is counted once.
    pub fn flush_active_time(&mut self, now: DateTime<Utc>) {
        if self.is_finalized() || !self.is_active {
            return;
        }
        let elapsed = (now - self.last_active_at).num_milliseconds().max(0);
        self.active_time_ms += elapsed;
        self.last_active_at = now;
    }

    /// Applies a foreground/idle transition.
    ///
    /// Going inactive flushes the accumulated interval first; going active
    /// resets the watermark so the inactive gap is never counted.
    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) {
        if self.is_finalized() || self.is_active == active {
            return;
        }
        if active {
            self.last_active_at = now;
            self.is_active = true;
        } else {
            self.flush_active_time(now);
            self.is_active = false;
        }
    }

    /// Stamps the end of the visit.
    ///
    /// Idempotent: a second call leaves `end_time`, `duration_ms` and
    /// `active_time_ms` untouched.
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        if self.is_finalized() {
            return;
        }
        self.flush_active_time(now);
        self.end_time = Some(now);
        self.duration_ms = (now - self.start_time).num_milliseconds().max(0);
        self.active_time_ms = self.active_time_ms.min(self.duration_ms);
        self.is_active = false;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn active_visit(url: &str) -> Visit {
        Visit::begin(
            NewVisit {
                url: url.to_string(),
                tab_id: TabId(1),
                window_id: WindowId(10),
                title: None,
                source: None,
                creation_mode: CreationMode::Chain,
                is_active: true,
            },
            &CategoryLists::default(),
            t0(),
        )
    }

    #[test]
    fn begin_stamps_zeroed_accumulators() {
        let visit = active_visit("https://github.com/rust-lang/rust");
        assert_eq!(visit.id.as_str(), format!("1-{}", t0().timestamp_millis()));
        assert_eq!(visit.domain, "github.com");
        assert_eq!(visit.category, Category::Work);
        assert_eq!(visit.duration_ms, 0);
        assert_eq!(visit.active_time_ms, 0);
        assert_eq!(visit.last_active_at, t0());
        assert!(visit.end_time.is_none());
    }

    #[test]
    fn begin_records_fallback_domains() {
        let visit = active_visit("not a url");
        assert!(visit.domain_fallback);
        assert_eq!(visit.category, Category::Other);
    }

    #[test]
    fn flush_counts_each_interval_once() {
        let mut visit = active_visit("https://example.com");
        visit.flush_active_time(t0() + TimeDelta::seconds(10));
        visit.flush_active_time(t0() + TimeDelta::seconds(25));
        assert_eq!(visit.active_time_ms, 25_000);
        assert_eq!(visit.last_active_at, t0() + TimeDelta::seconds(25));
    }

    #[test]
    fn flush_ignores_inactive_visits() {
        let mut visit = active_visit("https://example.com");
        visit.set_active(false, t0() + TimeDelta::seconds(5));
        visit.flush_active_time(t0() + TimeDelta::seconds(60));
        assert_eq!(visit.active_time_ms, 5_000);
    }

    #[test]
    fn reactivation_skips_the_inactive_gap() {
        let mut visit = active_visit("https://example.com");
        visit.set_active(false, t0() + TimeDelta::seconds(30));
        visit.set_active(true, t0() + TimeDelta::seconds(120));
        visit.flush_active_time(t0() + TimeDelta::seconds(150));
        // 30s before the gap + 30s after it
        assert_eq!(visit.active_time_ms, 60_000);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut visit = active_visit("https://example.com");
        visit.finalize(t0() + TimeDelta::seconds(120));
        let snapshot = visit.clone();
        visit.finalize(t0() + TimeDelta::seconds(500));
        assert_eq!(visit, snapshot);
    }

    #[test]
    fn finalize_computes_duration_and_clears_active() {
        let mut visit = active_visit("https://example.com");
        visit.finalize(t0() + TimeDelta::seconds(120));
        assert_eq!(visit.duration_ms, 120_000);
        assert_eq!(visit.active_time_ms, 120_000);
        assert!(!visit.is_active);
        assert_eq!(visit.end_time, Some(t0() + TimeDelta::seconds(120)));
    }

    #[test]
    fn finalized_active_time_never_exceeds_duration() {
        let mut visit = active_visit("https://example.com");
        // Watermark manipulation cannot push active time past duration.
        visit.flush_active_time(t0() + TimeDelta::seconds(50));
        visit.finalize(t0() + TimeDelta::seconds(50));
        assert!(visit.active_time_ms <= visit.duration_ms);
    }

    #[test]
    fn backwards_clock_clamps_to_zero() {
        let mut visit = active_visit("https://example.com");
        visit.flush_active_time(t0() - TimeDelta::seconds(10));
        assert_eq!(visit.active_time_ms, 0);
    }

    #[test]
    fn set_active_is_noop_after_finalize() {
        let mut visit = active_visit("https://example.com");
        visit.finalize(t0() + TimeDelta::seconds(10));
        visit.set_active(true, t0() + TimeDelta::seconds(20));
        assert!(!visit.is_active);
        assert_eq!(visit.active_time_ms, 10_000);
    }

    #[test]
    fn serde_defaults_cover_missing_fields() {
        // A record persisted before domain_fallback existed still loads.
        let json = r#"{"id":"1-0","url":"https://example.com","domain":"example.com",
                "category":"other","start_time":"2026-03-01T09:00:00Z",
                "last_active_at":"2026-03-01T09:00:00Z","tab_id":1,"window_id":10}"#;
        let visit: Visit = serde_json::from_str(json).unwrap();
        assert!(!visit.domain_fallback);
        assert_eq!(visit.active_time_ms, 0);
        assert_eq!(visit.creation_mode, CreationMode::Chain);
    }
}
