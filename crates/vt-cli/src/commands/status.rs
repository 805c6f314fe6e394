//! Status command showing today's aggregate stats.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use vt_engine::SessionAggregator;
use vt_store::SessionStore;

use crate::commands::util::format_duration_ms;

pub async fn run<W: Write, S: SessionStore>(
    writer: &mut W,
    aggregator: &SessionAggregator<S>,
    json: bool,
) -> Result<()> {
    let session = aggregator.current_session(Utc::now()).await;
    if json {
        serde_json::to_writer_pretty(&mut *writer, &session.stats)?;
        writeln!(writer)?;
        return Ok(());
    }

    let stats = &session.stats;
    writeln!(writer, "Session {}", session.date)?;
    writeln!(
        writer,
        "Visits: {} ({} unique URLs, {} domains)",
        stats.total_urls, stats.unique_urls, stats.unique_domains
    )?;
    writeln!(writer, "Work:   {}", format_duration_ms(stats.work_time_ms))?;
    writeln!(
        writer,
        "Social: {}",
        format_duration_ms(stats.social_time_ms)
    )?;
    writeln!(writer, "Other:  {}", format_duration_ms(stats.other_time_ms))?;
    writeln!(writer, "Total:  {}", format_duration_ms(stats.total_time_ms))?;
    Ok(())
}
