//! Per-day totals over a trailing window.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use vt_core::SessionStats;
use vt_engine::SessionAggregator;
use vt_store::SessionStore;

use crate::commands::util::format_duration_ms;

/// One reported day.
#[derive(Debug, Serialize)]
struct DaySummary {
    date: NaiveDate,
    #[serde(flatten)]
    stats: SessionStats,
}

pub async fn run<W: Write, S: SessionStore>(
    writer: &mut W,
    aggregator: &SessionAggregator<S>,
    days: u32,
    json: bool,
) -> Result<()> {
    let sessions = aggregator.session_history(days, Utc::now()).await;
    let summaries: Vec<DaySummary> = sessions
        .into_iter()
        .map(|session| DaySummary {
            date: session.date,
            stats: session.stats,
        })
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *writer, &summaries)?;
        writeln!(writer)?;
        return Ok(());
    }

    if summaries.is_empty() {
        writeln!(writer, "No sessions in the last {days} days.")?;
        return Ok(());
    }

    for day in summaries {
        writeln!(
            writer,
            "{}  {:>3} visits  work {:>7}  social {:>7}  total {:>7}",
            day.date,
            day.stats.total_urls,
            format_duration_ms(day.stats.work_time_ms),
            format_duration_ms(day.stats.social_time_ms),
            format_duration_ms(day.stats.total_time_ms),
        )?;
    }
    Ok(())
}
