//! Visit tracker CLI library.
//!
//! This crate provides the command-line interface over the visit tracking
//! engine: ingestion by replaying recorded host-event logs, plus read-side
//! reports against the session database.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ExportFormat};
pub use config::Config;
