use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vt_cli::commands::{cleanup, export, history, replay, status, visits};
use vt_cli::{Cli, Commands, Config};
use vt_engine::SessionAggregator;
use vt_store::SqliteStore;

/// Opens the session database, ensuring its parent directory exists.
fn open_store(config: &Config) -> Result<SqliteStore> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    SqliteStore::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Replay { file } => {
            replay::run(&mut out, open_store(&config)?, &config, &file).await?;
        }
        Commands::Status { json } => {
            let aggregator = SessionAggregator::new(open_store(&config)?);
            status::run(&mut out, &aggregator, json).await?;
        }
        Commands::History { days, json } => {
            let aggregator = SessionAggregator::new(open_store(&config)?);
            history::run(&mut out, &aggregator, days, json).await?;
        }
        Commands::Visits { json } => {
            let aggregator = SessionAggregator::new(open_store(&config)?);
            visits::run(&mut out, &aggregator, json).await?;
        }
        Commands::Export { date, format } => {
            let aggregator = SessionAggregator::new(open_store(&config)?);
            export::run(&mut out, &aggregator, date, format).await?;
        }
        Commands::Cleanup { days } => {
            let aggregator = SessionAggregator::new(open_store(&config)?);
            cleanup::run(&mut out, &aggregator, days.unwrap_or(config.retention_days)).await?;
        }
    }

    Ok(())
}
