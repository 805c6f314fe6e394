//! The per-tab visit state machine.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use vt_core::{CategoryLists, CreationMode, NewVisit, SourceInfo, TabId, Visit, VisitId, WindowId};
use vt_store::SessionStore;

use crate::aggregator::SessionAggregator;
use crate::clock::Clock;
use crate::events::{HostEvent, TabStatus};

/// Per-tab bookkeeping. Created lazily on the first event for a tab id,
/// dropped when the tab closes.
#[derive(Debug, Default)]
struct TabState {
    /// The tab's current, not-yet-finalized visit. At most one per tab.
    current: Option<Visit>,
    /// Last URL this tab finished a visit on.
    previous_url: Option<String>,
    /// Start instant of the tab's most recent visit. Starts are kept strictly
    /// increasing so composite visit ids never collide within a tab.
    last_start: Option<DateTime<Utc>>,
}

/// Pending hyperlink attribution for a tab the host has spawned but that has
/// not finished its first load yet. Consumed once, cleaned up on tab removal.
#[derive(Debug, Clone)]
struct PendingAttribution {
    source_tab: TabId,
    source_url: String,
    source_visit: VisitId,
}

#[derive(Debug)]
struct TrackerState {
    tabs: HashMap<TabId, TabState>,
    pending: HashMap<TabId, PendingAttribution>,
    focused_window: Option<WindowId>,
    focused_tab: Option<TabId>,
    user_active: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            tabs: HashMap::new(),
            pending: HashMap::new(),
            focused_window: None,
            focused_tab: None,
            // the idle detector only reports transitions, so assume active
            // until told otherwise
            user_active: true,
        }
    }
}

/// What a completed page load turned into, decided under the state lock.
enum LoadOutcome {
    TitlePatched(Visit),
    Navigated {
        finalized: Option<Visit>,
        created: Visit,
    },
}

/// The visit-tracking service.
///
/// Explicitly constructed with its store, clock and category lists; owns the
/// per-tab map and the pending-attribution table. In-memory state sits behind
/// a `std::sync::Mutex` that is never held across an await point; everything
/// persisted goes through the aggregator's serialized write path.
pub struct VisitTracker<S, C> {
    state: Mutex<TrackerState>,
    aggregator: SessionAggregator<S>,
    clock: C,
    categories: CategoryLists,
}

impl<S: SessionStore, C: Clock> VisitTracker<S, C> {
    pub fn new(store: S, clock: C, categories: CategoryLists) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            aggregator: SessionAggregator::new(store),
            clock,
            categories,
        }
    }

    /// The aggregation surface consumers read sessions through.
    pub fn aggregator(&self) -> &SessionAggregator<S> {
        &self.aggregator
    }

    /// Snapshot of a tab's live visit, if any.
    pub fn live_visit(&self, tab: TabId) -> Option<Visit> {
        self.lock_state()
            .tabs
            .get(&tab)
            .and_then(|t| t.current.clone())
    }

    /// Applies one host event.
    ///
    /// Storage failures are logged, never propagated: the next event or the
    /// periodic sync pass re-derives and rewrites current state.
    pub async fn handle_event(&self, event: HostEvent) {
        let now = self.clock.now();
        match event {
            HostEvent::TabActivated { tab, window } => {
                self.on_tab_activated(tab, window, now).await;
            }
            HostEvent::TabUpdated {
                tab,
                window,
                status,
                url,
                title,
            } => match (status, url) {
                (Some(TabStatus::Complete), Some(url)) => {
                    self.on_page_loaded(tab, window, url, title, now).await;
                }
                _ => {
                    if let Some(title) = title {
                        self.on_title_update(tab, title, now).await;
                    }
                }
            },
            HostEvent::TabRemoved { tab } => self.on_tab_removed(tab, now).await,
            HostEvent::WindowFocusChanged { window } => {
                self.lock_state().focused_window = window;
                self.apply_global_activity(now).await;
            }
            HostEvent::IdleStateChanged { state } => {
                self.lock_state().user_active = state.is_user_active();
                self.apply_global_activity(now).await;
            }
            HostEvent::NavigationCompleted {
                tab,
                window,
                frame,
                url,
            } => {
                // sub-frame loads never open or close visits
                if frame == 0 {
                    self.on_page_loaded(tab, window, url, None, now).await;
                }
            }
            HostEvent::NavigationTargetCreated {
                source_tab,
                new_tab,
            } => self.on_navigation_target(source_tab, new_tab),
        }
    }

    /// Flushes every live visit's active time and rewrites it. Driven by the
    /// periodic synchronizer; also useful as a final flush before shutdown.
    pub async fn sync_open_tabs(&self) {
        let now = self.clock.now();
        let live: Vec<Visit> = {
            let mut state = self.lock_state();
            state
                .tabs
                .values_mut()
                .filter_map(|tab_state| {
                    let visit = tab_state.current.as_mut()?;
                    visit.flush_active_time(now);
                    Some(visit.clone())
                })
                .collect()
        };
        for visit in live {
            // an event handler may have finalized and replaced this visit
            // while an earlier flush write was in flight; writing the stale
            // clone would resurrect it as a second open visit
            let still_current = {
                let state = self.lock_state();
                state
                    .tabs
                    .get(&visit.tab_id)
                    .and_then(|t| t.current.as_ref())
                    .is_some_and(|current| current.id == visit.id)
            };
            if still_current {
                self.persist(visit, now).await;
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist(&self, visit: Visit, now: DateTime<Utc>) {
        if let Err(error) = self.aggregator.upsert_visit(visit, now).await {
            tracing::warn!(%error, "visit write failed; periodic sync will supersede");
        }
    }

    async fn on_tab_activated(&self, tab: TabId, window: WindowId, now: DateTime<Utc>) {
        {
            let mut state = self.lock_state();
            state.focused_tab = Some(tab);
            state.focused_window = Some(window);
            state.tabs.entry(tab).or_default();
        }
        self.apply_global_activity(now).await;
    }

    /// A top-level load finished: finalize the old visit, resolve attribution
    /// and start the new one.
    async fn on_page_loaded(
        &self,
        tab: TabId,
        window: WindowId,
        url: String,
        title: Option<String>,
        now: DateTime<Utc>,
    ) {
        let outcome = {
            let mut state = self.lock_state();
            let is_active = state.user_active
                && state.focused_window == Some(window)
                && state.focused_tab == Some(tab);
            let pending = state.pending.remove(&tab);
            let tab_state = state.tabs.entry(tab).or_default();

            // hosts emit both updated(complete) and navigation-completed for
            // one physical load; a same-URL completion patches the title
            // instead of splitting the visit
            if let Some(current) = tab_state.current.as_mut().filter(|v| v.url == url) {
                if let Some(title) = title {
                    current.title = Some(title);
                }
                LoadOutcome::TitlePatched(current.clone())
            } else {
                let mut finalized = tab_state.current.take();
                if finalized.as_ref().is_some_and(Visit::is_finalized) {
                    // a live slot must never hold a finalized visit; fail
                    // open by dropping it and tracking the new page anyway
                    tracing::error!(%tab, "live slot held a finalized visit, discarding");
                    finalized = None;
                } else if let Some(previous) = finalized.as_mut() {
                    // a bumped start can sit ahead of the wall clock; never
                    // stamp an end before the visit's own start
                    let end = now.max(previous.start_time);
                    previous.finalize(end);
                }

                let (creation_mode, source) =
                    resolve_attribution(tab, pending, finalized.as_ref());
                // identity is tab id + start millis; redirect chains can land
                // two loads in one millisecond, so a colliding start is bumped
                // past the predecessor's to keep ids unique
                let start = match tab_state.last_start {
                    Some(last) if now <= last => last + TimeDelta::milliseconds(1),
                    _ => now,
                };
                let created = Visit::begin(
                    NewVisit {
                        url,
                        tab_id: tab,
                        window_id: window,
                        title,
                        source,
                        creation_mode,
                        is_active,
                    },
                    &self.categories,
                    start,
                );
                tab_state.previous_url = finalized.as_ref().map(|v| v.url.clone());
                tab_state.last_start = Some(start);
                tab_state.current = Some(created.clone());
                LoadOutcome::Navigated { finalized, created }
            }
        };

        match outcome {
            LoadOutcome::TitlePatched(visit) => self.persist(visit, now).await,
            LoadOutcome::Navigated { finalized, created } => {
                if let Some(finalized) = finalized {
                    self.persist(finalized, now).await;
                }
                self.persist(created, now).await;
            }
        }
    }

    async fn on_title_update(&self, tab: TabId, title: String, now: DateTime<Utc>) {
        let updated = {
            let mut state = self.lock_state();
            state
                .tabs
                .get_mut(&tab)
                .and_then(|t| t.current.as_mut())
                .map(|visit| {
                    visit.title = Some(title);
                    visit.clone()
                })
        };
        if let Some(visit) = updated {
            self.persist(visit, now).await;
        }
    }

    /// Recomputes `is_active` for every live visit from global focus/idle
    /// state and persists the ones that changed.
    async fn apply_global_activity(&self, now: DateTime<Utc>) {
        let changed: Vec<Visit> = {
            let mut state = self.lock_state();
            let user_active = state.user_active;
            let focused_window = state.focused_window;
            let focused_tab = state.focused_tab;
            state
                .tabs
                .iter_mut()
                .filter_map(|(tab_id, tab_state)| {
                    let visit = tab_state.current.as_mut()?;
                    let desired = user_active
                        && focused_window == Some(visit.window_id)
                        && focused_tab == Some(*tab_id);
                    if visit.is_active == desired {
                        return None;
                    }
                    visit.set_active(desired, now);
                    Some(visit.clone())
                })
                .collect()
        };
        for visit in changed {
            self.persist(visit, now).await;
        }
    }

    fn on_navigation_target(&self, source_tab: TabId, new_tab: TabId) {
        let mut state = self.lock_state();
        let entry = state
            .tabs
            .get(&source_tab)
            .and_then(|t| t.current.as_ref())
            .map(|visit| PendingAttribution {
                source_tab,
                source_url: visit.url.clone(),
                source_visit: visit.id.clone(),
            });
        match entry {
            Some(entry) => {
                state.pending.insert(new_tab, entry);
            }
            None => {
                tracing::debug!(%source_tab, %new_tab, "target created from tab without live visit");
            }
        }
    }

    async fn on_tab_removed(&self, tab: TabId, now: DateTime<Utc>) {
        let ended = {
            let mut state = self.lock_state();
            state.pending.remove(&tab);
            state.pending.retain(|_, entry| entry.source_tab != tab);
            state.tabs.remove(&tab).and_then(|t| t.current)
        };
        if let Some(mut visit) = ended {
            visit.finalize(now);
            self.persist(visit, now).await;
        }
        if let Err(error) = self.aggregator.close_tab_session(tab, now).await {
            tracing::warn!(%tab, %error, "tab session close write failed");
        }
    }
}

/// Hyperlink wins only when the pending entry names a genuinely different
/// source tab; a same-tab entry is dropped and chain attribution applies.
/// When nothing attributes the load, the mode stays chain with no source.
fn resolve_attribution(
    tab: TabId,
    pending: Option<PendingAttribution>,
    previous: Option<&Visit>,
) -> (CreationMode, Option<SourceInfo>) {
    if let Some(entry) = pending {
        if entry.source_tab != tab {
            return (
                CreationMode::Hyperlink,
                Some(SourceInfo {
                    visit_id: entry.source_visit,
                    url: entry.source_url,
                    tab_id: entry.source_tab,
                }),
            );
        }
        tracing::debug!(%tab, "dropping same-tab attribution entry");
    }
    let source = previous.map(|prev| SourceInfo {
        visit_id: prev.id.clone(),
        url: prev.url.clone(),
        tab_id: prev.tab_id,
    });
    (CreationMode::Chain, source)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use vt_core::Category;
    use vt_store::MemoryStore;

    use super::*;
    use crate::clock::ManualClock;
    use crate::events::IdleState;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn lists() -> CategoryLists {
        CategoryLists {
            work: vec!["work.example".to_string()],
            social: vec!["social.example".to_string()],
        }
    }

    fn setup() -> (VisitTracker<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::starting_at(t0());
        let tracker = VisitTracker::new(MemoryStore::new(), clock.clone(), lists());
        (tracker, clock)
    }

    async fn activate(tracker: &VisitTracker<MemoryStore, ManualClock>, tab: i64, window: i64) {
        tracker
            .handle_event(HostEvent::TabActivated {
                tab: TabId(tab),
                window: WindowId(window),
            })
            .await;
    }

    async fn load(tracker: &VisitTracker<MemoryStore, ManualClock>, tab: i64, window: i64, url: &str) {
        tracker
            .handle_event(HostEvent::TabUpdated {
                tab: TabId(tab),
                window: WindowId(window),
                status: Some(TabStatus::Complete),
                url: Some(url.to_string()),
                title: None,
            })
            .await;
    }

    async fn session_now(
        tracker: &VisitTracker<MemoryStore, ManualClock>,
        clock: &ManualClock,
    ) -> vt_core::BrowsingSession {
        tracker.aggregator().current_session(clock.now()).await
    }

    #[tokio::test]
    async fn chain_navigation_accounts_full_active_time() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;

        clock.advance(TimeDelta::seconds(120));
        load(&tracker, 1, 1, "https://social.example/feed").await;

        let session = session_now(&tracker, &clock).await;
        let visits = session.all_visits();
        assert_eq!(visits.len(), 2);

        let first = visits[0];
        assert_eq!(first.duration_ms, 120_000);
        assert_eq!(first.active_time_ms, 120_000);
        assert_eq!(first.category, Category::Work);
        assert!(first.is_finalized());

        let second = visits[1];
        assert_eq!(second.start_time, t0() + TimeDelta::seconds(120));
        assert_eq!(second.creation_mode, CreationMode::Chain);
        assert_eq!(second.category, Category::Social);
        let source = second.source.as_ref().unwrap();
        assert_eq!(source.url, "https://work.example/docs");
        assert_eq!(source.tab_id, TabId(1));
        assert_eq!(source.visit_id, first.id);
    }

    #[tokio::test]
    async fn idle_pauses_and_resumes_accounting() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;

        // idle detector fires after its threshold elapses
        clock.advance(TimeDelta::seconds(60));
        tracker
            .handle_event(HostEvent::IdleStateChanged {
                state: IdleState::Idle,
            })
            .await;

        let paused = tracker.live_visit(TabId(1)).unwrap();
        assert!(!paused.is_active);
        assert_eq!(paused.active_time_ms, 60_000);

        // 30 idle seconds must never be counted
        clock.advance(TimeDelta::seconds(30));
        tracker
            .handle_event(HostEvent::IdleStateChanged {
                state: IdleState::Active,
            })
            .await;

        clock.advance(TimeDelta::seconds(30));
        tracker.sync_open_tabs().await;

        let resumed = tracker.live_visit(TabId(1)).unwrap();
        assert!(resumed.is_active);
        assert_eq!(resumed.active_time_ms, 90_000);
    }

    #[tokio::test]
    async fn tab_removal_finalizes_and_closes() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;

        clock.advance(TimeDelta::seconds(45));
        tracker
            .handle_event(HostEvent::TabRemoved { tab: TabId(1) })
            .await;

        assert!(tracker.live_visit(TabId(1)).is_none());

        let session = session_now(&tracker, &clock).await;
        let tab = session.tab(TabId(1)).unwrap();
        assert_eq!(tab.closed_at, Some(t0() + TimeDelta::seconds(45)));
        assert_eq!(tab.visits.len(), 1);
        assert!(tab.visits[0].is_finalized());
        assert_eq!(tab.visits[0].duration_ms, 45_000);
    }

    #[tokio::test]
    async fn same_instant_loads_keep_distinct_identities() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        // a redirect chain delivers both loads within the same millisecond
        load(&tracker, 1, 1, "https://work.example/redirect").await;
        load(&tracker, 1, 1, "https://work.example/landed").await;

        let session = session_now(&tracker, &clock).await;
        let tab = session.tab(TabId(1)).unwrap();
        assert_eq!(tab.visits.len(), 2);
        assert_ne!(tab.visits[0].id, tab.visits[1].id);
        assert!(tab.visits[0].is_finalized());
        assert!(tab.visits[0].end_time.unwrap() >= tab.visits[0].start_time);
        assert!(tab.visits[1].start_time > tab.visits[0].start_time);
    }

    #[tokio::test]
    async fn sync_does_not_resurrect_a_replaced_visit() {
        // A navigation that lands while the sync pass is mid-write must not
        // have its freshly finalized visit overwritten by the stale clone the
        // sync pass took before the navigation. Several tabs and repetitions
        // cover the map's arbitrary iteration order.
        for _ in 0..32 {
            let (tracker, clock) = setup();
            for tab in 1..=3 {
                activate(&tracker, tab, 1).await;
                load(&tracker, tab, 1, &format!("https://work.example/{tab}")).await;
            }
            clock.advance(TimeDelta::seconds(5));

            tokio::join!(tracker.sync_open_tabs(), async {
                load(&tracker, 2, 1, "https://work.example/next").await;
            });

            let session = session_now(&tracker, &clock).await;
            let tab = session.tab(TabId(2)).unwrap();
            let open: Vec<&str> = tab
                .visits
                .iter()
                .filter(|v| !v.is_finalized())
                .map(|v| v.url.as_str())
                .collect();
            assert_eq!(open, ["https://work.example/next"]);
        }
    }

    #[tokio::test]
    async fn at_most_one_live_visit_per_tab() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        for url in [
            "https://work.example/one",
            "https://work.example/two",
            "https://work.example/three",
        ] {
            load(&tracker, 1, 1, url).await;
            clock.advance(TimeDelta::seconds(10));

            let session = session_now(&tracker, &clock).await;
            let open = session
                .tab(TabId(1))
                .unwrap()
                .visits
                .iter()
                .filter(|v| !v.is_finalized())
                .count();
            assert_eq!(open, 1);
        }

        let session = session_now(&tracker, &clock).await;
        assert_eq!(session.tab(TabId(1)).unwrap().visits.len(), 3);
    }

    #[tokio::test]
    async fn hyperlink_attribution_is_consumed_exactly_once() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;
        let source_visit = tracker.live_visit(TabId(1)).unwrap();

        tracker
            .handle_event(HostEvent::NavigationTargetCreated {
                source_tab: TabId(1),
                new_tab: TabId(2),
            })
            .await;

        load(&tracker, 2, 1, "https://social.example/feed").await;
        let opened = tracker.live_visit(TabId(2)).unwrap();
        assert_eq!(opened.creation_mode, CreationMode::Hyperlink);
        let source = opened.source.as_ref().unwrap();
        assert_eq!(source.tab_id, TabId(1));
        assert_eq!(source.url, "https://work.example/docs");
        assert_eq!(source.visit_id, source_visit.id);

        // the entry is gone: the next load in tab 2 chains off tab 2 itself
        clock.advance(TimeDelta::seconds(5));
        load(&tracker, 2, 1, "https://social.example/other").await;
        let chained = tracker.live_visit(TabId(2)).unwrap();
        assert_eq!(chained.creation_mode, CreationMode::Chain);
        assert_eq!(
            chained.source.as_ref().unwrap().url,
            "https://social.example/feed"
        );
    }

    #[tokio::test]
    async fn same_tab_attribution_entry_falls_back_to_chain() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;

        // a link that navigated in place reports the tab as its own source
        tracker
            .handle_event(HostEvent::NavigationTargetCreated {
                source_tab: TabId(1),
                new_tab: TabId(1),
            })
            .await;

        clock.advance(TimeDelta::seconds(5));
        load(&tracker, 1, 1, "https://work.example/next").await;
        let visit = tracker.live_visit(TabId(1)).unwrap();
        assert_eq!(visit.creation_mode, CreationMode::Chain);
        assert_eq!(
            visit.source.as_ref().unwrap().url,
            "https://work.example/docs"
        );
    }

    #[tokio::test]
    async fn target_from_tab_without_visit_leaves_chain_unattributed() {
        let (tracker, _clock) = setup();
        tracker
            .handle_event(HostEvent::NavigationTargetCreated {
                source_tab: TabId(7),
                new_tab: TabId(2),
            })
            .await;

        load(&tracker, 2, 1, "https://work.example/docs").await;
        let visit = tracker.live_visit(TabId(2)).unwrap();
        assert_eq!(visit.creation_mode, CreationMode::Chain);
        assert!(visit.source.is_none());
    }

    #[tokio::test]
    async fn removing_source_tab_purges_its_pending_entries() {
        let (tracker, _clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;
        tracker
            .handle_event(HostEvent::NavigationTargetCreated {
                source_tab: TabId(1),
                new_tab: TabId(2),
            })
            .await;
        tracker
            .handle_event(HostEvent::TabRemoved { tab: TabId(1) })
            .await;

        load(&tracker, 2, 1, "https://social.example/feed").await;
        let visit = tracker.live_visit(TabId(2)).unwrap();
        assert_eq!(visit.creation_mode, CreationMode::Chain);
        assert!(visit.source.is_none());
    }

    #[tokio::test]
    async fn title_only_update_patches_in_place() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;

        tracker
            .handle_event(HostEvent::TabUpdated {
                tab: TabId(1),
                window: WindowId(1),
                status: None,
                url: None,
                title: Some("Docs – Home".to_string()),
            })
            .await;

        let session = session_now(&tracker, &clock).await;
        let tab = session.tab(TabId(1)).unwrap();
        assert_eq!(tab.visits.len(), 1);
        assert_eq!(tab.visits[0].title.as_deref(), Some("Docs – Home"));
    }

    #[tokio::test]
    async fn duplicate_load_events_yield_one_visit() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;
        tracker
            .handle_event(HostEvent::NavigationCompleted {
                tab: TabId(1),
                window: WindowId(1),
                frame: 0,
                url: "https://work.example/docs".to_string(),
            })
            .await;

        let session = session_now(&tracker, &clock).await;
        assert_eq!(session.tab(TabId(1)).unwrap().visits.len(), 1);
    }

    #[tokio::test]
    async fn subframe_navigation_is_ignored() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        tracker
            .handle_event(HostEvent::NavigationCompleted {
                tab: TabId(1),
                window: WindowId(1),
                frame: 3,
                url: "https://ads.example/frame".to_string(),
            })
            .await;

        assert!(tracker.live_visit(TabId(1)).is_none());
        let session = session_now(&tracker, &clock).await;
        assert!(session.tabs.is_empty());
    }

    #[tokio::test]
    async fn losing_window_focus_pauses_every_visit() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;

        clock.advance(TimeDelta::seconds(30));
        tracker
            .handle_event(HostEvent::WindowFocusChanged { window: None })
            .await;
        let paused = tracker.live_visit(TabId(1)).unwrap();
        assert!(!paused.is_active);
        assert_eq!(paused.active_time_ms, 30_000);

        clock.advance(TimeDelta::seconds(60));
        tracker
            .handle_event(HostEvent::WindowFocusChanged {
                window: Some(WindowId(1)),
            })
            .await;
        clock.advance(TimeDelta::seconds(10));
        tracker.sync_open_tabs().await;

        let resumed = tracker.live_visit(TabId(1)).unwrap();
        assert_eq!(resumed.active_time_ms, 40_000);
    }

    #[tokio::test]
    async fn background_tab_accumulates_nothing() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;
        activate(&tracker, 2, 1).await;
        load(&tracker, 2, 1, "https://social.example/feed").await;

        clock.advance(TimeDelta::seconds(300));
        tracker.sync_open_tabs().await;

        let background = tracker.live_visit(TabId(1)).unwrap();
        let foreground = tracker.live_visit(TabId(2)).unwrap();
        assert_eq!(background.active_time_ms, 0);
        assert_eq!(foreground.active_time_ms, 300_000);
    }

    #[tokio::test]
    async fn switching_tabs_moves_the_active_flag() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;
        activate(&tracker, 2, 1).await;
        load(&tracker, 2, 1, "https://social.example/feed").await;

        clock.advance(TimeDelta::seconds(20));
        activate(&tracker, 1, 1).await;

        let first = tracker.live_visit(TabId(1)).unwrap();
        let second = tracker.live_visit(TabId(2)).unwrap();
        assert!(first.is_active);
        assert!(!second.is_active);
        assert_eq!(second.active_time_ms, 20_000);
    }

    #[tokio::test]
    async fn write_failure_keeps_tracking_alive() {
        let (tracker, clock) = setup();
        tracker.aggregator().store().set_fail_writes(true);

        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/docs").await;
        assert!(tracker.live_visit(TabId(1)).is_some());
        assert!(tracker.aggregator().store().is_empty());

        // the next sync pass supersedes the lost write
        tracker.aggregator().store().set_fail_writes(false);
        clock.advance(TimeDelta::seconds(30));
        tracker.sync_open_tabs().await;

        let session = session_now(&tracker, &clock).await;
        assert_eq!(session.tab(TabId(1)).unwrap().visits.len(), 1);
        assert_eq!(session.stats.total_time_ms, 30_000);
    }

    #[tokio::test]
    async fn tab_session_cumulative_tracks_visit_mutations() {
        let (tracker, clock) = setup();
        activate(&tracker, 1, 1).await;
        load(&tracker, 1, 1, "https://work.example/one").await;
        clock.advance(TimeDelta::seconds(10));
        load(&tracker, 1, 1, "https://work.example/two").await;
        clock.advance(TimeDelta::seconds(20));
        tracker.sync_open_tabs().await;

        let session = session_now(&tracker, &clock).await;
        let tab = session.tab(TabId(1)).unwrap();
        assert_eq!(
            tab.active_time_ms,
            tab.visits.iter().map(|v| v.active_time_ms).sum::<i64>()
        );
        assert_eq!(tab.active_time_ms, 30_000);
    }
}
