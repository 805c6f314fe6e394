//! Implementation of the `vt export` command.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use vt_engine::SessionAggregator;
use vt_store::SessionStore;

use crate::ExportFormat;

pub async fn run<W: Write, S: SessionStore>(
    writer: &mut W,
    aggregator: &SessionAggregator<S>,
    date: Option<NaiveDate>,
    format: ExportFormat,
) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    match format {
        ExportFormat::Json => {
            let Some(session) = aggregator.export_session(date).await? else {
                bail!("no session recorded for {date}");
            };
            serde_json::to_writer_pretty(&mut *writer, &session)?;
            writeln!(writer)?;
        }
        ExportFormat::Csv => {
            let Some(csv) = aggregator.export_csv(date).await? else {
                bail!("no session recorded for {date}");
            };
            writer.write_all(csv.as_bytes())?;
        }
    }
    Ok(())
}
