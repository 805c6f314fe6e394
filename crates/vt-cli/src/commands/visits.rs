//! Today's flattened visit list.

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
    let visits = aggregator.all_url_visits(Utc::now()).await;
    if json {
        serde_json::to_writer_pretty(&mut *writer, &visits)?;
        writeln!(writer)?;
        return Ok(());
    }

    if visits.is_empty() {
        writeln!(writer, "No visits recorded today.")?;
        return Ok(());
    }

    for visit in visits {
        writeln!(
            writer,
            "{}  {:<6} {:>7}  {}",
            visit.start_time.format("%H:%M:%S"),
            visit.category,
            format_duration_ms(visit.active_time_ms),
            visit.url,
        )?;
    }
    Ok(())
}
