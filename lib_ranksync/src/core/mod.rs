//! # Sync Core
//!
//! The runtime half of the crate: collaborator traits, the snapshot loader,
//! the stream supervisor, the reconnection policy and the `RankingSync`
//! composition root that ties them to one private state.
//!
//! ## Components:
//!
//! - **`source`**: the `SnapshotSource` and `UpdateChannel` seams and the
//!   `ChannelEvent` vocabulary a push connection speaks.
//! - **`loader`**: foreground and silent snapshot loads with
//!   stale-while-error semantics.
//! - **`supervisor`**: single-connection lifecycle and the status machine.
//! - **`reconnect`**: fixed-delay, single-flight reconnect timer.
//! - **`state`**: the state record and the torn-down guard every
//!   asynchronous continuation passes through.
//! - **`sync`**: `RankingSync`, the public entry point.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

mod loader;
mod state;
mod supervisor;

/// Fixed-delay single-flight reconnect timer.
pub mod reconnect;
/// Collaborator traits for snapshot and push sources.
pub mod source;
/// The `RankingSync` composition root.
pub mod sync;

pub use reconnect::ReconnectPolicy;
pub use source::{ChannelEvent, SnapshotSource, UpdateChannel};
pub use sync::RankingSync;
