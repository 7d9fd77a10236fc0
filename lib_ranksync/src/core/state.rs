//! # Client State
//!
//! Every mutable field of one sync client lives in a single `SyncState`
//! behind one mutex, and every transition goes through `Shared::apply`.
//! `apply` refuses to run once the client is torn down, which is what keeps
//! late load completions and late connection events from touching the view
//! after deactivation.
//!
//! The mutex is never held across an `.await`; each transition is a short
//! synchronous turn. Views are sent to subscribers after the mutex is
//! released and carry the revision of the transition that produced them, so
//! a view that loses the race to the watch channel is dropped instead of
//! overwriting a newer one. A subscriber holding a `watch::Ref` may call
//! back into the client without deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::reconnect::ReconnectPolicy;
use super::source::{SnapshotSource, UpdateChannel};
use crate::configs::SyncConfig;
use crate::errors::SyncError;
use crate::model::{RankEntry, RankingView, StreamStatus};

/// Handle on the live push connection. Closing cancels the token the
/// connection task selects on; the task then drops the event stream.
pub(crate) struct Connection {
    pub(crate) id: u64,
    token: CancellationToken,
}

impl Connection {
    pub(crate) fn new(id: u64, token: CancellationToken) -> Self {
        Self { id, token }
    }

    pub(crate) fn close(self) {
        self.token.cancel();
    }
}

pub(crate) struct SyncState {
    pub(crate) rankings: Arc<Vec<RankEntry>>,
    pub(crate) last_updated_at: Option<DateTime<Utc>>,
    pub(crate) is_loading: bool,
    pub(crate) is_refreshing: bool,
    pub(crate) error: Option<SyncError>,
    pub(crate) status: StreamStatus,
    pub(crate) activated: bool,
    pub(crate) torn_down: bool,
    pub(crate) connection: Option<Connection>,
    pub(crate) next_connection_id: u64,
    pub(crate) reconnect: ReconnectPolicy,
    revision: u64,
}

impl SyncState {
    fn new(config: &SyncConfig) -> Self {
        Self {
            rankings: Arc::new(Vec::new()),
            last_updated_at: None,
            is_loading: false,
            is_refreshing: false,
            error: None,
            status: StreamStatus::Idle,
            activated: false,
            torn_down: false,
            connection: None,
            next_connection_id: 0,
            reconnect: ReconnectPolicy::new(config.reconnect_delay),
            revision: 0,
        }
    }

    pub(crate) fn view(&self) -> RankingView {
        RankingView {
            rankings: Arc::clone(&self.rankings),
            is_loading: self.is_loading,
            is_refreshing: self.is_refreshing,
            error: self.error.clone(),
            last_updated_at: self.last_updated_at,
            stream_status: self.status,
        }
    }

    /// True while `id` names the connection currently owned by the client.
    pub(crate) fn is_current(&self, id: u64) -> bool {
        !self.torn_down && self.connection.as_ref().is_some_and(|c| c.id == id)
    }
}

/// State and collaborators shared between the client handle and its tasks.
pub(crate) struct Shared {
    state: Mutex<SyncState>,
    view_tx: watch::Sender<RankingView>,
    // Only read and written inside the watch channel's write lock.
    sent_revision: AtomicU64,
    pub(crate) shutdown: CancellationToken,
    pub(crate) source: Arc<dyn SnapshotSource>,
    pub(crate) channel: Arc<dyn UpdateChannel>,
    pub(crate) config: SyncConfig,
}

impl Shared {
    pub(crate) fn new(
        config: SyncConfig,
        source: Arc<dyn SnapshotSource>,
        channel: Arc<dyn UpdateChannel>,
    ) -> Self {
        let (view_tx, _) = watch::channel(RankingView::default());
        Self {
            state: Mutex::new(SyncState::new(&config)),
            view_tx,
            sent_revision: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
            source,
            channel,
            config,
        }
    }

    // Transitions are single assignments; a panic mid-transition cannot leave
    // a half-applied state worth refusing.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one transition and publishes the re-derived view. Returns `None`
    /// without touching anything once the client is torn down.
    pub(crate) fn apply<R>(&self, transition: impl FnOnce(&mut SyncState) -> R) -> Option<R> {
        let mut state = self.lock();
        if state.torn_down {
            return None;
        }
        let out = transition(&mut state);
        self.publish(state);
        Some(out)
    }

    /// Derives the view under the lock, releases the lock, then sends.
    pub(crate) fn publish(&self, mut state: MutexGuard<'_, SyncState>) {
        state.revision += 1;
        let revision = state.revision;
        let view = state.view();
        drop(state);

        log::trace!(
            "view #{}: {} rows, loading={}, refreshing={}, stream={}",
            revision,
            view.rankings.len(),
            view.is_loading,
            view.is_refreshing,
            view.stream_status
        );
        self.view_tx.send_if_modified(|current| {
            if revision <= self.sent_revision.load(Ordering::Relaxed) {
                return false;
            }
            self.sent_revision.store(revision, Ordering::Relaxed);
            *current = view;
            true
        });
    }

    pub(crate) fn current_view(&self) -> RankingView {
        self.view_tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RankingView> {
        self.view_tx.subscribe()
    }
}
