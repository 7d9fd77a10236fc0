//! # Ranking Sync Client
//!
//! The composition root. A `RankingSync` wires the snapshot loader, the
//! stream supervisor and the reconnection policy around one private state
//! and exposes the result as a `RankingView`.
//!
//! Lifecycle: `new` → `activate` → (`refresh`)* → `deactivate`. Dropping the
//! client deactivates it. All methods that spawn work must be called from
//! inside a Tokio runtime.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::loader::spawn_load;
use super::source::{SnapshotSource, UpdateChannel};
use super::state::Shared;
use super::supervisor;
use crate::configs::SyncConfig;
use crate::model::{RankingView, StreamStatus};

/// A live, self-healing leaderboard.
pub struct RankingSync {
    shared: Arc<Shared>,
}

impl RankingSync {
    /// Creates an inactive client. Nothing is fetched or opened until
    /// `activate` is called.
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn SnapshotSource>,
        channel: Arc<dyn UpdateChannel>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::new(config, source, channel)),
        }
    }

    /// Builds a client backed by the REST snapshot endpoint and the
    /// Server-Sent-Events stream described by `config`.
    #[cfg(feature = "http")]
    pub fn from_config(config: SyncConfig) -> Result<Self, crate::errors::SyncError> {
        use crate::ingestors::SseUpdateChannel;
        use crate::retrieve::HttpSnapshotSource;

        let source = HttpSnapshotSource::from_config(&config)?;
        let channel = SseUpdateChannel::from_config(&config);
        Ok(Self::new(config, Arc::new(source), Arc::new(channel)))
    }

    /// Starts the foreground initial load, then the push stream.
    ///
    /// Returns the handle of the initial load. A second activation, or an
    /// activation after `deactivate`, is a no-op.
    pub fn activate(&self) -> Option<JoinHandle<()>> {
        {
            let mut state = self.shared.lock();
            if state.torn_down || state.activated {
                log::debug!("Ignoring activation: already active or torn down");
                return None;
            }
            state.activated = true;
        }

        log::info!(
            "Activating ranking sync (page size {}, reconnect delay {}ms)",
            self.shared.config.page_size,
            self.shared.config.reconnect_delay.as_millis()
        );
        let initial = spawn_load(&self.shared, false);
        supervisor::start(&self.shared);
        Some(initial)
    }

    /// Foreground reload on demand. Works in every stream status, does not
    /// wait for or cancel a silent reload already in flight.
    pub fn refresh(&self) -> JoinHandle<()> {
        spawn_load(&self.shared, false)
    }

    /// Drops the current push connection and opens a new one right away,
    /// cancelling any pending reconnect.
    pub fn restart_stream(&self) {
        supervisor::start(&self.shared);
    }

    /// Stops the stream, cancels timers, and freezes the view. Idempotent.
    pub fn deactivate(&self) {
        supervisor::stop(&self.shared);
    }

    /// Current view.
    pub fn view(&self) -> RankingView {
        self.shared.current_view()
    }

    /// Receiver notified with every re-derived view.
    ///
    /// State queries such as `stream_status` are safe while a `watch::Ref`
    /// is held. Calls that change state (`refresh`, `restart_stream`,
    /// `deactivate`) publish a new view and must not be made from the thread
    /// holding the `Ref`; clone the view out of `borrow()` first.
    pub fn subscribe(&self) -> watch::Receiver<RankingView> {
        self.shared.subscribe()
    }

    /// Current push channel status.
    pub fn stream_status(&self) -> StreamStatus {
        self.shared.lock().status
    }

    /// True while a reconnect timer is armed.
    pub fn reconnect_pending(&self) -> bool {
        self.shared.lock().reconnect.is_pending()
    }

    /// Construction-time configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }
}

impl Drop for RankingSync {
    fn drop(&mut self) {
        supervisor::stop(&self.shared);
    }
}
