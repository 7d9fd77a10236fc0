use std::num::NonZeroU32;
use std::time::Duration;

use crate::errors::SyncError;

/// Default number of leaderboard rows requested per snapshot.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Fixed delay between a stream failure and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// Name of the event the server sends once the stream is established.
pub const DEFAULT_INIT_EVENT: &str = "init";
/// Name of the event the server sends whenever the ranking changes.
pub const DEFAULT_UPDATE_EVENT: &str = "ranking_update";
/// REST path of the ranking snapshot, relative to the API base.
pub const DEFAULT_RANK_PATH: &str = "api/rankings";
/// Path of the Server-Sent-Events stream, relative to the API base.
pub const DEFAULT_STREAM_PATH: &str = "api/rankings/stream";

/// # Sync Configuration
///
/// Construction-time parameters of a `RankingSync` client and of the HTTP
/// collaborators built from it. The page size and reconnect delay are fixed
/// for the lifetime of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Rows requested per snapshot (`?count=`).
    pub page_size: NonZeroU32,
    /// Delay before a reconnection attempt. No backoff is applied.
    pub reconnect_delay: Duration,
    /// Event name that confirms the stream is open.
    pub init_event: String,
    /// Event name that signals a ranking change.
    pub update_event: String,
    /// Base URL of the API. Without it both endpoints stay relative.
    pub api_base: Option<String>,
    /// Snapshot path below the API base.
    pub rank_path: String,
    /// Stream path below the API base.
    pub stream_path: String,
    /// Timeout of a single snapshot request.
    pub request_timeout: Duration,
    /// Bearer token attached to snapshot requests.
    pub auth_token: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            init_event: DEFAULT_INIT_EVENT.to_string(),
            update_event: DEFAULT_UPDATE_EVENT.to_string(),
            api_base: None,
            rank_path: DEFAULT_RANK_PATH.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            request_timeout: Duration::from_secs(10),
            auth_token: None,
        }
    }
}

/// Resolved endpoint locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Ranking snapshot endpoint.
    pub rank: String,
    /// Server-Sent-Events endpoint.
    pub stream: String,
}

impl SyncConfig {
    /// Default configuration with a validated page size.
    pub fn with_page_size(page_size: u32) -> Result<Self, SyncError> {
        let page_size = NonZeroU32::new(page_size)
            .ok_or_else(|| SyncError::Config("page size must be a positive integer".to_string()))?;
        Ok(Self { page_size, ..Self::default() })
    }

    /// Sets the API base. Blank values are treated as "not configured".
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base = if base.trim().is_empty() { None } else { Some(base.trim().to_string()) };
        self
    }

    /// Sets the reconnect delay.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Resolves the snapshot and stream locations against `api_base`.
    ///
    /// Without a base, both are returned as root-relative paths.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            rank: join_base(self.api_base.as_deref(), &self.rank_path),
            stream: join_base(self.api_base.as_deref(), &self.stream_path),
        }
    }
}

fn join_base(base: Option<&str>, path: &str) -> String {
    let path = path.trim_start_matches('/');
    match base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), path),
        None => format!("/{}", path),
    }
}
