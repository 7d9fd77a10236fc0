//! # Push Ingestors Module
//!
//! Clients for server-initiated change notifications. Each submodule
//! implements `core::UpdateChannel` for one transport.
//!
//! ## Contained Modules:
//! - **`sse_channel`**: Server-Sent-Events channel built on
//!   `reqwest-eventsource`, with the transport's own retries switched off so
//!   reconnection stays with the sync client.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The Server-Sent-Events update channel.
pub mod sse_channel;

pub use sse_channel::SseUpdateChannel;
