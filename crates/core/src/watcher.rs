//! Surface-completion watcher
//!
//! Polls an open authorization surface until it yields a callback, closes,
//! or times out. Polling is an explicit state machine driven by a tokio
//! interval plus a cancellation handle, so every terminal state shuts the
//! timer down deliberately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use monart_domain::CallbackParams;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;
use url::Url;

use crate::ports::SurfaceHandle;

/// Explicit cancellation for an in-progress watch
///
/// Cloneable so the caller can keep one end while the watch loop observes
/// the other.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Observation of the surface at one poll tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    /// Surface open, location unreadable or still on the provider's origin
    Pending,
    /// Surface closed without reaching the callback
    Closed,
    /// Surface reached the callback path but the expected parameters are
    /// missing
    Redirected(Url),
    /// Callback reached with code and state extracted
    Matched(CallbackParams),
}

/// Terminal result of a watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Code and state extracted; the surface has been closed
    Matched(CallbackParams),
    /// User closed the surface before completing authorization
    Closed,
    /// The caller cancelled the watch
    Cancelled,
    /// Deadline elapsed without a terminal observation
    TimedOut,
    /// Callback reached without the expected code/state parameters
    MalformedCallback,
}

/// Polls a [`SurfaceHandle`] until a terminal condition is observed
#[derive(Debug, Clone)]
pub struct SurfaceWatcher {
    callback_prefix: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl SurfaceWatcher {
    /// Create a watcher matching locations under `callback_uri`
    #[must_use]
    pub fn new(callback_uri: impl Into<String>, poll_interval: Duration, timeout: Duration) -> Self {
        Self { callback_prefix: callback_uri.into(), poll_interval, timeout }
    }

    /// Classify the surface at a single poll tick
    ///
    /// Cross-origin unreadability is expected while the surface is on the
    /// provider's domain and maps to `Pending`.
    #[must_use]
    pub fn classify_tick(&self, handle: &dyn SurfaceHandle) -> WatchState {
        if handle.is_closed() {
            return WatchState::Closed;
        }

        match handle.location() {
            Some(url) if self.is_callback(&url) => match parse_callback(&url) {
                Some(params) => WatchState::Matched(params),
                None => WatchState::Redirected(url),
            },
            _ => WatchState::Pending,
        }
    }

    /// Poll until a terminal condition, cancellation, or the deadline
    ///
    /// The surface is closed before returning on `Matched`,
    /// `MalformedCallback`, and `TimedOut`.
    pub async fn watch(
        &self,
        handle: &dyn SurfaceHandle,
        cancel: &CancelHandle,
    ) -> WatchOutcome {
        let deadline = Instant::now() + self.timeout;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if cancel.is_cancelled() {
                debug!("surface watch cancelled");
                return WatchOutcome::Cancelled;
            }

            match self.classify_tick(handle) {
                WatchState::Pending => {}
                WatchState::Closed => {
                    debug!("surface closed before completing authorization");
                    return WatchOutcome::Closed;
                }
                WatchState::Redirected(url) => {
                    debug!(%url, "callback reached without code/state parameters");
                    handle.close();
                    return WatchOutcome::MalformedCallback;
                }
                WatchState::Matched(params) => {
                    debug!("callback matched, authorization code extracted");
                    handle.close();
                    return WatchOutcome::Matched(params);
                }
            }

            if Instant::now() >= deadline {
                debug!("surface watch deadline elapsed");
                handle.close();
                return WatchOutcome::TimedOut;
            }
        }
    }

    fn is_callback(&self, url: &Url) -> bool {
        url.as_str().starts_with(&self.callback_prefix)
    }
}

fn parse_callback(url: &Url) -> Option<CallbackParams> {
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(CallbackParams { code: code?, state: state? })
}
