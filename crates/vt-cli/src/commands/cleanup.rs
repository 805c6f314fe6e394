//! Retention sweep over old sessions.

use std::io::Write;

use anyhow::Result;
use chrono::Utc;
use vt_engine::SessionAggregator;
use vt_store::SessionStore;

pub async fn run<W: Write, S: SessionStore>(
    writer: &mut W,
    aggregator: &SessionAggregator<S>,
    days: u32,
) -> Result<()> {
    let removed = aggregator.cleanup_older_than(days, Utc::now()).await?;
    writeln!(writer, "Removed {removed} sessions older than {days} days")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Days;
    use vt_core::BrowsingSession;
    use vt_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn sweep_reports_the_removed_count() {
        let aggregator = SessionAggregator::new(MemoryStore::new());
        let today = Utc::now().date_naive();
        for offset in [0u64, 10, 45] {
            let date = today - Days::new(offset);
            aggregator
                .import_session(&BrowsingSession::new(date))
                .await
                .unwrap();
        }

        let mut output = Vec::new();
        run(&mut output, &aggregator, 30).await.unwrap();

        assert!(String::from_utf8(output)
            .unwrap()
            .contains("Removed 1 sessions older than 30 days"));
        assert_eq!(aggregator.store().len(), 2);
    }
}
