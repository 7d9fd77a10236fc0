//! # Data Model
//!
//! Leaderboard rows, the push-channel status and the public view snapshot.

/// Leaderboard rows and response-shape normalization.
pub mod rank_entry;
/// The consumer-facing view and the stream status.
pub mod view;

pub use rank_entry::{normalize_rankings, RankEntry};
pub use view::{RankingView, StreamStatus};
