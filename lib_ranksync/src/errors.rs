use thiserror::Error;

/// Errors produced while loading a ranking snapshot or wiring up the
/// collaborators.
///
/// Variants carry strings rather than source errors so the last error can
/// live inside the cloneable `RankingView`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("HTTP {status} from ranking endpoint: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SyncError::Decode(e.to_string())
        } else {
            SyncError::Transport(e.to_string())
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest_middleware::Error> for SyncError {
    fn from(e: reqwest_middleware::Error) -> Self {
        match e {
            reqwest_middleware::Error::Reqwest(inner) => inner.into(),
            other => SyncError::Transport(other.to_string()),
        }
    }
}

#[cfg(feature = "http")]
impl From<url::ParseError> for SyncError {
    fn from(e: url::ParseError) -> Self {
        SyncError::InvalidEndpoint(e.to_string())
    }
}
