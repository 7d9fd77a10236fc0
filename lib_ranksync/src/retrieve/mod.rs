//! # Data Retrieval Module
//!
//! Request/response access to the ranking API.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: a generic `ApiClient` built on `reqwest` and
//!   `reqwest-middleware`, with optional exponential-backoff retries.
//! - **`rank_http`**: `HttpSnapshotSource`, the REST implementation of the
//!   snapshot seam, built on `ApiClient` with retries disabled.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with optional retry middleware.
pub mod ky_http;
/// REST snapshot source for the leaderboard.
pub mod rank_http;

pub use ky_http::{ApiClient, ApiResponse};
pub use rank_http::HttpSnapshotSource;
