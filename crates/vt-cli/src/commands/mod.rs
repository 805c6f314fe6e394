//! CLI subcommand implementations.

pub mod cleanup;
pub mod export;
pub mod history;
pub mod replay;
pub mod status;
pub mod util;
pub mod visits;
