//! Flattened tabular export of a day's session.

use std::borrow::Cow;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::session::BrowsingSession;
use crate::visit::CreationMode;

/// One row of the flattened tabular form, for download/reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRow {
    pub domain: String,
    pub title: String,
    /// ISO calendar date.
    pub date: String,
    /// Start-of-visit time of day, `HH:MM:SS` UTC.
    pub time_of_day: String,
    pub duration_ms: i64,
    pub active_time_ms: i64,
    pub category: Category,
    pub creation_mode: CreationMode,
    /// URL of the attributing visit, empty when unattributed.
    pub source_url: String,
}

/// Flattens a session into chronological report rows.
#[must_use]
pub fn visit_rows(session: &BrowsingSession) -> Vec<VisitRow> {
    session
        .all_visits()
        .into_iter()
        .map(|visit| VisitRow {
            domain: visit.domain.clone(),
            title: visit.title.clone().unwrap_or_default(),
            date: session.date.to_string(),
            time_of_day: visit.start_time.format("%H:%M:%S").to_string(),
            duration_ms: visit.duration_ms,
            active_time_ms: visit.active_time_ms,
            category: visit.category,
            creation_mode: visit.creation_mode,
            source_url: visit
                .source
                .as_ref()
                .map(|s| s.url.clone())
                .unwrap_or_default(),
        })
        .collect()
}

/// Renders rows as CSV with minimal quoting.
#[must_use]
pub fn rows_to_csv(rows: &[VisitRow]) -> String {
    let mut out = String::from(
        "domain,title,date,time_of_day,duration_ms,active_time_ms,category,creation_mode,source_url\n",
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{}",
            csv_field(&row.domain),
            csv_field(&row.title),
            row.date,
            row.time_of_day,
            row.duration_ms,
            row.active_time_ms,
            row.category,
            row.creation_mode,
            csv_field(&row.source_url),
        );
    }
    out
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
