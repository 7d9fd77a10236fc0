//! # SSE Update Channel
//!
//! `UpdateChannel` over a Server-Sent-Events endpoint, using
//! `reqwest-eventsource`.
//!
//! The event source's own retry loop is disabled: every connection lives
//! exactly until its first error or end of stream, and the next attempt is
//! scheduled by the sync client's reconnection policy. That keeps a single
//! owner for "when do we reconnect".
//!
//! Capability: a native client can only open an absolute `http(s)` URL. When
//! the stream endpoint resolves to a relative path (no API base configured)
//! or the channel was built `disabled`, the channel reports itself
//! unsupported and the client runs snapshot-only.

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest_eventsource::{retry, Event, EventSource};
use url::Url;

use crate::configs::SyncConfig;
use crate::core::{ChannelEvent, UpdateChannel};

/// Server-Sent-Events push channel.
pub struct SseUpdateChannel {
    client: reqwest::Client,
    url: Option<Url>,
    auth_token: Option<String>,
}

impl SseUpdateChannel {
    /// Channel for `endpoint`. Unsupported unless `endpoint` is an absolute
    /// http(s) URL.
    pub fn new(endpoint: &str, auth_token: Option<String>) -> Self {
        let url = Url::parse(endpoint)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"));
        if url.is_none() {
            log::warn!("Stream endpoint '{}' is not an absolute http(s) URL", endpoint);
        }

        Self {
            client: reqwest::Client::new(),
            url,
            auth_token,
        }
    }

    /// Channel for the stream endpoint resolved from `config`.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.endpoints().stream, config.auth_token.clone())
    }

    /// A channel that is never supported, for snapshot-only deployments.
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            url: None,
            auth_token: None,
        }
    }

    /// The stream URL, when supported.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }
}

impl UpdateChannel for SseUpdateChannel {
    fn is_supported(&self) -> bool {
        self.url.is_some()
    }

    fn connect(&self) -> BoxStream<'static, ChannelEvent> {
        let Some(url) = self.url.clone() else {
            return stream::once(async { ChannelEvent::Failed("push channel unsupported".to_string()) }).boxed();
        };

        let mut request = self.client.get(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        match EventSource::new(request) {
            Ok(mut source) => {
                source.set_retry_policy(Box::new(retry::Never));
                source.map(map_event).boxed()
            }
            Err(e) => {
                let reason = e.to_string();
                stream::once(async move { ChannelEvent::Failed(reason) }).boxed()
            }
        }
    }
}

fn map_event(item: Result<Event, reqwest_eventsource::Error>) -> ChannelEvent {
    match item {
        Ok(Event::Open) => ChannelEvent::Open,
        // Unnamed SSE events arrive with the default type "message".
        Ok(Event::Message(message)) if message.event == "message" => ChannelEvent::Message { data: message.data },
        Ok(Event::Message(message)) => ChannelEvent::Named {
            event: message.event,
            data: message.data,
        },
        Err(e) => ChannelEvent::Failed(e.to_string()),
    }
}
