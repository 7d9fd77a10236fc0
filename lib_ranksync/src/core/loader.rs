//! # Snapshot Loader
//!
//! One load = one call to the `SnapshotSource` for the configured page size.
//!
//! - The loading flag (`is_loading` for foreground, `is_refreshing` for
//!   silent) is raised and the error cleared synchronously, before the fetch
//!   task is spawned, so the caller observes the flag as soon as it asks.
//! - Success replaces the whole row list and stamps `last_updated_at`.
//! - Failure records the error and leaves rows and timestamp alone
//!   (stale-while-error).
//! - Either way the flag raised at invocation is lowered.
//!
//! Loads are not serialized against each other. When two overlap, the one
//! that completes last determines the final state. The loader never retries.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;

use super::state::Shared;
use crate::model::normalize_rankings;

/// Starts a load and returns the handle of its fetch task.
///
/// On a torn-down client nothing is changed and the returned task is empty.
pub(crate) fn spawn_load(shared: &Arc<Shared>, silent: bool) -> JoinHandle<()> {
    let started = shared.apply(|state| {
        if silent {
            state.is_refreshing = true;
        } else {
            state.is_loading = true;
        }
        state.error = None;
    });

    if started.is_none() {
        log::debug!("Load skipped: client is torn down");
        return tokio::spawn(async {});
    }

    let shared = Arc::clone(shared);
    tokio::spawn(async move { run_load(shared, silent).await })
}

async fn run_load(shared: Arc<Shared>, silent: bool) {
    let count = shared.config.page_size;

    let result = tokio::select! {
        biased;
        _ = shared.shutdown.cancelled() => return,
        result = shared.source.fetch(count) => result,
    };

    shared.apply(|state| {
        match result {
            Ok(body) => {
                let rows = normalize_rankings(&body);
                log::debug!("Loaded {} ranking rows (silent={})", rows.len(), silent);
                state.rankings = Arc::new(rows);
                state.last_updated_at = Some(Utc::now());
                state.error = None;
            }
            Err(e) => {
                log::warn!("Ranking snapshot load failed (silent={}): {}", silent, e);
                state.error = Some(e);
            }
        }

        if silent {
            state.is_refreshing = false;
        } else {
            state.is_loading = false;
        }
    });
}
