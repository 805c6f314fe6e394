//! Time source abstraction.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current instant.
///
/// Injected rather than calling `Utc::now()` inline so the state machine's
/// watermark arithmetic is testable against a controlled timeline.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and event-log replay.
///
/// Clones share the same instant, so a handle kept by the caller moves time
/// for a tracker that owns another clone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self
            .instant
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = instant;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut instant = self
            .instant
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *instant += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .instant
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
