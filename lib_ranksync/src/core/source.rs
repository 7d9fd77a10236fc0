//! # Collaborator Seams
//!
//! The sync client talks to the outside world through two traits: a
//! request/response `SnapshotSource` and a push `UpdateChannel`. The HTTP
//! implementations live behind the `http` feature; tests drive the client
//! with in-memory implementations that emit synthetic `ChannelEvent`s.

use std::num::NonZeroU32;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use serde_json::Value;

use crate::errors::SyncError;

/// Returns the current full ranking for a requested page size.
///
/// The raw body is returned untouched; shape normalization is the loader's
/// job so that a mismatch never turns into an error.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetches one snapshot.
    fn fetch(&self, count: NonZeroU32) -> BoxFuture<'_, Result<Value, SyncError>>;
}

/// One transport-level event of a push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Handshake succeeded.
    Open,
    /// An event with an explicit name.
    Named {
        /// Event name.
        event: String,
        /// Raw payload.
        data: String,
    },
    /// An untyped message.
    Message {
        /// Raw payload.
        data: String,
    },
    /// The connection failed or was closed by the remote side.
    Failed(String),
}

/// Opens push connections.
pub trait UpdateChannel: Send + Sync + 'static {
    /// Capability check, consulted before every connection attempt.
    fn is_supported(&self) -> bool;

    /// Opens a new connection.
    ///
    /// Must return without blocking: the handshake happens while the stream
    /// is polled and is reported as `ChannelEvent::Open`. Dropping the stream
    /// closes the connection. A stream that ends is treated like `Failed`.
    fn connect(&self) -> BoxStream<'static, ChannelEvent>;
}
