//! # Stream Supervisor
//!
//! Owns at most one push connection and drives the status machine:
//!
//! ```text
//! idle ──start──▶ connecting ──open / init event──▶ open
//!   │                 ▲  │                            │
//!   │                 │  └──────failure / close───────┤
//!   │           reconnect timer                       ▼
//!   │                 └───────────────────────────  error
//!   └──capability check fails──▶ unsupported (terminal)
//! ```
//!
//! Every connection gets an id. Transition functions only act when the id
//! still names the client's current connection, so an event that races a
//! replacement or a teardown is dropped instead of applied.
//!
//! Update events are change signals only. Their payload is parsed for the
//! log and then ignored; the data of record always comes from a silent
//! snapshot reload.

use std::sync::Arc;

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::loader::spawn_load;
use super::source::ChannelEvent;
use super::state::{Connection, Shared};
use crate::configs::SyncConfig;
use crate::model::StreamStatus;

/// Opens a fresh connection, replacing any existing one and cancelling any
/// pending reconnect.
pub(crate) fn start(shared: &Arc<Shared>) {
    let mut state = shared.lock();
    if state.torn_down {
        return;
    }

    if !shared.channel.is_supported() {
        state.reconnect.cancel();
        if let Some(previous) = state.connection.take() {
            previous.close();
        }
        if state.status != StreamStatus::Unsupported {
            log::warn!("Push updates are not supported here; falling back to snapshot-only operation");
            state.status = StreamStatus::Unsupported;
            shared.publish(state);
        }
        return;
    }

    state.reconnect.cancel();
    if let Some(previous) = state.connection.take() {
        log::debug!("Closing stream connection #{} before reconnecting", previous.id);
        previous.close();
    }

    state.next_connection_id += 1;
    let id = state.next_connection_id;
    let token = shared.shutdown.child_token();
    let events = shared.channel.connect();

    state.connection = Some(Connection::new(id, token.clone()));
    state.status = StreamStatus::Connecting;
    shared.publish(state);

    log::info!("Connecting ranking stream #{}", id);
    tokio::spawn(drive(Arc::clone(shared), id, token, events));
}

/// Closes the connection, cancels the reconnect timer and tears the client
/// down. Safe to call any number of times.
pub(crate) fn stop(shared: &Shared) {
    let mut state = shared.lock();
    state.reconnect.cancel();
    if let Some(connection) = state.connection.take() {
        connection.close();
    }
    let first = !state.torn_down;
    state.torn_down = true;
    drop(state);

    shared.shutdown.cancel();
    if first {
        log::info!("Ranking sync deactivated");
    }
}

async fn drive(
    shared: Arc<Shared>,
    id: u64,
    token: CancellationToken,
    mut events: BoxStream<'static, ChannelEvent>,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            event = events.next() => event,
        };

        let Some(event) = event else {
            on_failure(&shared, id, "stream ended");
            return;
        };

        match classify(&shared.config, event) {
            Signal::Opened => on_open(&shared, id),
            Signal::Update { data } => {
                log::debug!("Stream #{} update event received", id);
                on_update(&shared, id, &data);
            }
            Signal::Fallback { event, data } => {
                log::debug!("Stream #{} unrecognized event '{}'; treating it as a change signal", id, event);
                on_update(&shared, id, &data);
            }
            Signal::Failed(reason) => {
                on_failure(&shared, id, &reason);
                return;
            }
        }
    }
}

/// What a channel event means to the supervisor.
#[derive(Debug, PartialEq)]
enum Signal {
    Opened,
    Update { data: String },
    Fallback { event: String, data: String },
    Failed(String),
}

/// Maps a channel event through the configured init and update event names.
/// Untyped messages and unknown names take the fallback path.
fn classify(config: &SyncConfig, event: ChannelEvent) -> Signal {
    match event {
        ChannelEvent::Open => Signal::Opened,
        ChannelEvent::Named { event, .. } if event == config.init_event => Signal::Opened,
        ChannelEvent::Named { event, data } if event == config.update_event => Signal::Update { data },
        ChannelEvent::Named { event, data } => Signal::Fallback { event, data },
        ChannelEvent::Message { data } => Signal::Fallback {
            event: "message".to_string(),
            data,
        },
        ChannelEvent::Failed(reason) => Signal::Failed(reason),
    }
}

/// Handshake or init event.
fn on_open(shared: &Shared, id: u64) {
    let mut state = shared.lock();
    if !state.is_current(id) || state.status == StreamStatus::Open {
        return;
    }
    state.status = StreamStatus::Open;
    shared.publish(state);
    log::info!("Ranking stream #{} open", id);
}

/// Update event or untyped message: re-verify with a silent reload.
fn on_update(shared: &Arc<Shared>, id: u64, data: &str) {
    if !shared.lock().is_current(id) {
        return;
    }

    match serde_json::from_str::<Value>(data) {
        Ok(payload) => log::trace!("Stream #{} payload: {}", id, payload),
        Err(e) => log::debug!("Stream #{} payload is not JSON ({}); reloading anyway", id, e),
    }

    spawn_load(shared, true);
}

/// Error or close: mark the status, drop the connection, arm one reconnect.
fn on_failure(shared: &Arc<Shared>, id: u64, reason: &str) {
    let mut state = shared.lock();
    if !state.is_current(id) {
        return;
    }

    if let Some(connection) = state.connection.take() {
        connection.close();
    }
    state.status = StreamStatus::Error;

    let delay = state.reconnect.delay();
    let retry = Arc::clone(shared);
    state.reconnect.schedule(&shared.shutdown, move || start(&retry));
    shared.publish(state);

    log::warn!(
        "Ranking stream #{} failed: {}. Reconnecting in {}ms",
        id,
        reason,
        delay.as_millis()
    );
}
