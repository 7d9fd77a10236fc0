use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::rank_entry::RankEntry;
use crate::errors::SyncError;

/// Connection status of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    /// Not started yet.
    #[default]
    Idle,
    /// A connection attempt is in progress.
    Connecting,
    /// The channel is delivering events.
    Open,
    /// The last attempt failed; a reconnect is scheduled.
    Error,
    /// Push updates cannot be used here at all. Terminal.
    Unsupported,
}

impl StreamStatus {
    /// Lowercase label for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Idle => "idle",
            StreamStatus::Connecting => "connecting",
            StreamStatus::Open => "open",
            StreamStatus::Error => "error",
            StreamStatus::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Ranking View
///
/// The read-only snapshot handed to consumers. A new value is derived after
/// every internal state change; cloning is cheap because the row list is
/// shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RankingView {
    /// Rows from the last successful load.
    pub rankings: Arc<Vec<RankEntry>>,
    /// A foreground (initial or manual) load is in flight.
    pub is_loading: bool,
    /// A silent, push-triggered load is in flight.
    pub is_refreshing: bool,
    /// Error of the last load, cleared by the next attempt.
    pub error: Option<SyncError>,
    /// Completion time of the last successful load.
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Push channel status.
    pub stream_status: StreamStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        let labels: Vec<String> = [
            StreamStatus::Idle,
            StreamStatus::Connecting,
            StreamStatus::Open,
            StreamStatus::Error,
            StreamStatus::Unsupported,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(labels, vec!["idle", "connecting", "open", "error", "unsupported"]);
        assert_eq!(serde_json::to_string(&StreamStatus::Open).unwrap(), "\"open\"");
    }

    #[test]
    fn test_default_view_is_empty_and_idle() {
        let view = RankingView::default();
        assert!(view.rankings.is_empty());
        assert!(!view.is_loading && !view.is_refreshing);
        assert_eq!(view.stream_status, StreamStatus::Idle);
        assert!(view.last_updated_at.is_none());
    }
}
