//! Visit-tracking state machine and session aggregation engine.
//!
//! The [`VisitTracker`] consumes raw host lifecycle events (tab focus, page
//! loads, window focus, idle transitions, link-opened tabs) and maintains one
//! authoritative live visit per open tab. Finalized and updated visits flow
//! into the [`SessionAggregator`], which owns the per-day session documents
//! and serializes every read-modify-write against the store. The periodic
//! synchronizer re-enters the same path on a timer so active-time accounting
//! survives an abrupt process unload.

pub mod aggregator;
pub mod clock;
pub mod events;
pub mod sync;
pub mod tracker;

pub use aggregator::SessionAggregator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{HostEvent, IdleState, TabStatus};
pub use sync::{DEFAULT_SYNC_INTERVAL, SyncHandle, spawn_periodic_sync};
pub use tracker::VisitTracker;
