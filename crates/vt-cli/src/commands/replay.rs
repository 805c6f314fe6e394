//! Implementation of the `vt replay` command.
//!
//! Reads a JSONL log of timestamped host events and drives the tracker with
//! a manual clock pinned to each record's instant, so replaying yesterday's
//! log reproduces yesterday's sessions exactly.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use vt_engine::{Clock, HostEvent, IdleState, ManualClock, VisitTracker, spawn_periodic_sync};
use vt_store::SessionStore;

use crate::Config;
use crate::commands::util::format_duration_ms;

/// One recorded host event with the instant it was observed.
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    at: DateTime<Utc>,
    event: HostEvent,
}

pub async fn run<W: Write, S: SessionStore + 'static>(
    writer: &mut W,
    store: S,
    config: &Config,
    path: &Path,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let clock = ManualClock::starting_at(Utc::now());
    let tracker = Arc::new(VisitTracker::new(
        store,
        clock.clone(),
        config.categories.clone(),
    ));
    // long replays persist progressively rather than only at the end
    let sync = spawn_periodic_sync(
        Arc::clone(&tracker),
        Duration::from_secs(config.sync_interval_secs.max(1)),
    );
    let idle_gap =
        TimeDelta::seconds(i64::try_from(config.idle_threshold_secs).unwrap_or(i64::MAX));

    let mut applied = 0usize;
    let mut last_at: Option<DateTime<Utc>> = None;
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(&line)
            .with_context(|| format!("malformed record on line {}", index + 1))?;

        // Logs from bridges that do not hook the idle detector still get
        // idle accounting: silence past the threshold counts as the user
        // going idle at the threshold and returning at the next event.
        if let Some(previous) = last_at {
            if record.at - previous > idle_gap {
                clock.set(previous + idle_gap);
                tracker
                    .handle_event(HostEvent::IdleStateChanged {
                        state: IdleState::Idle,
                    })
                    .await;
                clock.set(record.at);
                tracker
                    .handle_event(HostEvent::IdleStateChanged {
                        state: IdleState::Active,
                    })
                    .await;
            }
        }

        clock.set(record.at);
        tracker.handle_event(record.event).await;
        applied += 1;
        last_at = Some(record.at);
    }
    // runs one final flush of any still-open tabs
    sync.shutdown().await;

    let session = tracker.aggregator().current_session(clock.now()).await;
    writeln!(writer, "Replayed {applied} events")?;
    writeln!(writer, "Date: {}", session.date)?;
    writeln!(writer, "Visits: {}", session.stats.total_urls)?;
    writeln!(
        writer,
        "Active time: {}",
        format_duration_ms(session.stats.total_time_ms)
    )?;
    Ok(())
}
