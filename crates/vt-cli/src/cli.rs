//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Browser visit tracker.
///
/// Turns a stream of browser host events into per-day browsing sessions with
/// per-visit active time and category totals.
#[derive(Debug, Parser)]
#[command(name = "vt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a recorded host-event log into the session database.
    Replay {
        /// JSONL file of `{"at": ..., "event": ...}` records.
        file: PathBuf,
    },

    /// Show today's browsing stats.
    Status {
        /// Emit stats as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Per-day totals, most recent day first.
    History {
        /// How many days back to report.
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Emit summaries as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Today's visits in chronological order.
    Visits {
        /// Emit visits as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print one day's session on stdout.
    Export {
        /// Day to export (defaults to today, UTC).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },

    /// Delete sessions older than the retention window.
    Cleanup {
        /// Override the configured retention window.
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Output formats for `vt export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// The structured session document.
    Json,
    /// One flattened row per visit.
    Csv,
}
