use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lib_ranksync::{SyncConfig, SyncError};

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Live clan leaderboard watcher", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "RANK_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "RANK_API_BASE", help = "Base URL of the ranking API.")]
    pub api_base: Option<String>,

    #[clap(long, env = "RANK_AUTH_TOKEN", help = "Bearer token for snapshot and stream requests.")]
    pub auth_token: Option<String>,

    #[clap(long, env = "RANK_PAGE_SIZE", help = "Number of leaderboard rows to request.")]
    pub page_size: Option<u32>,

    #[clap(long, env = "RANK_RECONNECT_DELAY_MS", help = "Fixed delay in milliseconds before reconnecting the update stream.")]
    pub reconnect_delay_ms: Option<u64>,

    #[clap(long, env = "RANK_REQUEST_TIMEOUT_MS", help = "Timeout in milliseconds of a snapshot request.")]
    pub request_timeout_ms: Option<u64>,

    #[clap(
        long,
        env = "RANK_DISABLE_STREAM",
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Do not open the update stream; snapshot-only operation."
    )]
    pub disable_stream: Option<bool>,

    #[clap(long, env = "RANK_REFRESH_EVERY_SECS", help = "Also force a manual refresh every N seconds.")]
    pub refresh_every_secs: Option<u64>,

    #[clap(long, env = "RANK_SHOW_TOP", help = "Number of rows printed per update.")]
    pub show_top: Option<usize>,

    #[clap(long, env = "RANK_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "RANK_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            api_base: other.api_base.or(self.api_base),
            auth_token: other.auth_token.or(self.auth_token),
            page_size: other.page_size.or(self.page_size),
            reconnect_delay_ms: other.reconnect_delay_ms.or(self.reconnect_delay_ms),
            request_timeout_ms: other.request_timeout_ms.or(self.request_timeout_ms),
            disable_stream: other.disable_stream.or(self.disable_stream),
            refresh_every_secs: other.refresh_every_secs.or(self.refresh_every_secs),
            show_top: other.show_top.or(self.show_top),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }

    fn defaults() -> Config {
        Config {
            page_size: Some(20),
            reconnect_delay_ms: Some(3000),
            request_timeout_ms: Some(10_000),
            disable_stream: Some(false),
            show_top: Some(10),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            ..Default::default()
        }
    }

    /// Builds the client configuration.
    pub fn sync_config(&self) -> Result<SyncConfig, SyncError> {
        let mut sync = SyncConfig::with_page_size(self.page_size.unwrap_or(20))?;
        if let Some(base) = &self.api_base {
            sync = sync.api_base(base.clone());
        }
        if let Some(ms) = self.reconnect_delay_ms {
            sync = sync.reconnect_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.request_timeout_ms {
            sync.request_timeout = Duration::from_millis(ms);
        }
        sync.auth_token = self.auth_token.clone();
        Ok(sync)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

/// Reads a camelCase JSON config file. Missing or unreadable files are
/// reported and skipped.
fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display());
        return None;
    }

    match fs::read_to_string(path) {
        Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
            Ok(file_config) => Some(file_config),
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Layers the configuration: defaults < config file < environment/CLI.
pub fn resolve(cli: Config) -> Config {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("rank_watch.conf"));

    let mut current_config = Config::defaults();
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }

    current_config.merge(cli)
}

pub fn load_config() -> Config {
    // clap::Parser handles both CLI arguments and their env fallbacks.
    resolve(Config::parse())
}
