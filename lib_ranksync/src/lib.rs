//! # lib_ranksync
//!
//! Keeps an in-memory leaderboard consistent with a ranking API that offers
//! two independent sources: a full-snapshot REST endpoint and a
//! Server-Sent-Events stream that announces changes. Push events never carry
//! the data of record; they trigger a silent snapshot reload. Stream failures
//! are retried after a fixed delay for as long as the client is active.
//!
//! ```no_run
//! use lib_ranksync::{RankingSync, SyncConfig};
//!
//! # async fn run() -> Result<(), lib_ranksync::SyncError> {
//! let config = SyncConfig::with_page_size(20)?.api_base("https://clan.example.com");
//! let sync = RankingSync::from_config(config)?;
//! sync.activate();
//!
//! let mut views = sync.subscribe();
//! while views.changed().await.is_ok() {
//!     let view = views.borrow().clone();
//!     println!("{} rows, stream {}", view.rankings.len(), view.stream_status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod configs;
pub mod core;
pub mod errors;
pub mod model;

#[cfg(feature = "http")]
pub mod ingestors;
#[cfg(feature = "http")]
pub mod retrieve;

pub use crate::configs::{Endpoints, SyncConfig};
pub use crate::core::{ChannelEvent, RankingSync, ReconnectPolicy, SnapshotSource, UpdateChannel};
pub use crate::errors::SyncError;
pub use crate::model::{normalize_rankings, RankEntry, RankingView, StreamStatus};
