use std::num::NonZeroU32;

use futures_util::future::BoxFuture;
use reqwest::Method;
use serde_json::Value;

use super::ky_http::ApiClient;
use crate::configs::SyncConfig;
use crate::core::SnapshotSource;
use crate::errors::SyncError;

/// REST implementation of `SnapshotSource`: `GET <rank-path>?count=N`.
///
/// The client is built without retry middleware; a failed load is recovered
/// by the next push-triggered reload or a manual refresh, never here.
pub struct HttpSnapshotSource {
    client: ApiClient,
    path: String,
}

impl HttpSnapshotSource {
    /// Builds the source from the API base and rank path of `config`.
    ///
    /// # Errors
    /// `SyncError::InvalidEndpoint` when no absolute API base is configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let base = config.api_base.as_deref().ok_or_else(|| {
            SyncError::InvalidEndpoint(format!(
                "ranking endpoint {} is relative; an API base is required",
                config.endpoints().rank
            ))
        })?;

        Ok(Self {
            client: ApiClient::new(base, config.auth_token.clone(), 0, config.request_timeout)?,
            path: config.rank_path.clone(),
        })
    }

    async fn fetch_value(&self, count: NonZeroU32) -> Result<Value, SyncError> {
        let response = match self
            .client
            .request::<Value, ()>(Method::GET, &self.path, &[("count", count.to_string())], None, None)
            .await
        {
            Ok(response) => response,
            // A 2xx body that is not JSON is a shape mismatch, not a failure.
            Err(SyncError::Decode(e)) => {
                log::warn!("Ranking snapshot body is not JSON ({}); treating as empty", e);
                return Ok(Value::Null);
            }
            Err(e) => return Err(e),
        };

        if response.success {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            Err(SyncError::Http {
                status: response.status,
                body: response.error_body.unwrap_or_default(),
            })
        }
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch(&self, count: NonZeroU32) -> BoxFuture<'_, Result<Value, SyncError>> {
        Box::pin(self.fetch_value(count))
    }
}
