//! # Reconnection Policy
//!
//! Schedules one delayed reconnection attempt after a push-channel failure.
//! The delay is a fixed constant and retries are unbounded: the leaderboard
//! keeps trying for as long as the client is active.
//!
//! Single-flight: a new `schedule` cancels the pending timer before arming a
//! new one, so two failures inside one delay window produce one attempt. Each
//! timer runs on a child of the client's shutdown token, so teardown cancels
//! it even if nobody calls `cancel`.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Fixed-delay reconnect timer holding at most one pending attempt.
pub struct ReconnectPolicy {
    delay: Duration,
    pending: Option<CancellationToken>,
}

impl ReconnectPolicy {
    /// Creates an idle policy.
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// The fixed reconnect delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms the timer. `attempt` runs once after the delay unless the timer
    /// is cancelled, replaced, or `parent` is cancelled first.
    pub fn schedule<F>(&mut self, parent: &CancellationToken, attempt: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.cancel() {
            log::debug!("Replacing pending reconnect timer");
        }

        let token = parent.child_token();
        self.pending = Some(token.clone());
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log::trace!("Reconnect timer cancelled");
                }
                _ = sleep(delay) => {
                    if token.is_cancelled() {
                        return;
                    }
                    // Mark as consumed so `is_pending` reports false from here on.
                    token.cancel();
                    attempt();
                }
            }
        });
    }

    /// Cancels the pending timer. Returns `true` if one was armed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(token) => {
                let was_armed = !token.is_cancelled();
                token.cancel();
                was_armed
            }
            None => false,
        }
    }

    /// True while a timer is armed and has not fired.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|token| !token.is_cancelled())
    }
}

impl Drop for ReconnectPolicy {
    fn drop(&mut self) {
        self.cancel();
    }
}
