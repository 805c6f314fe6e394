//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use vt_core::CategoryLists;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the session database file.
    pub database_path: PathBuf,

    /// Silence longer than this is accounted as idle time during replay.
    pub idle_threshold_secs: u64,

    /// How often live visits are flushed to the store.
    pub sync_interval_secs: u64,

    /// Sessions older than this many days are dropped by `vt cleanup`.
    pub retention_days: u32,

    /// Domain membership lists for work/social classification.
    pub categories: CategoryLists,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("visits.db"),
            idle_threshold_secs: 60,
            sync_interval_secs: 30,
            retention_days: 90,
            categories: CategoryLists::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Layering, lowest precedence first: built-in defaults, `config.toml`
    /// in the platform config dir, the explicit `--config` file, then
    /// `VT_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("VT_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for vt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vt"))
}

/// Returns the platform-specific data directory for vt.
///
/// On Linux: `~/.local/share/vt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("vt"))
}
