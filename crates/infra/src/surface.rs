//! Loopback authorization surface
//!
//! The authorization popup becomes a loopback HTTP server plus the
//! system browser: the authorization URL opens in the browser,
//! the identity provider redirects back to `redirect_uri` on localhost,
//! and the serving task captures that full callback URL for the watcher
//! to observe through the handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::RawQuery;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use monart_core::ports::{AuthorizationSurface, SurfaceError, SurfaceHandle};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;

use crate::browser;

const CALLBACK_PAGE: &str = r"<!DOCTYPE html>
<html>
<head><title>Authorization Complete</title></head>
<body><h1>Authorization Complete</h1><p>You can close this window and return to the app.</p></body>
</html>";

/// Authorization surface backed by a loopback callback server
pub struct LoopbackSurface {
    redirect_uri: String,
    launch_browser: bool,
}

impl LoopbackSurface {
    /// Create a surface serving callbacks at `redirect_uri`
    ///
    /// The URI must name a loopback host with an explicit port; its path
    /// is the route the callback server answers on.
    #[must_use]
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self { redirect_uri: redirect_uri.into(), launch_browser: true }
    }

    /// Skip launching the system browser on `open`
    ///
    /// Used by tests and headless runs where the callback is driven
    /// directly.
    #[must_use]
    pub fn without_browser(mut self) -> Self {
        self.launch_browser = false;
        self
    }
}

#[async_trait]
impl AuthorizationSurface for LoopbackSurface {
    async fn open(&self, url: &str) -> Result<Box<dyn SurfaceHandle>, SurfaceError> {
        let redirect = Url::parse(&self.redirect_uri)
            .map_err(|err| SurfaceError::Open(format!("invalid redirect URI: {err}")))?;
        let port = redirect
            .port_or_known_default()
            .ok_or_else(|| SurfaceError::Open("redirect URI missing port".to_string()))?;

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|err| SurfaceError::Open(format!("failed to bind callback server: {err}")))?;

        let captured: Arc<Mutex<Option<Url>>> = Arc::new(Mutex::new(None));
        let callback_base = self.redirect_uri.clone();
        let captured_clone = captured.clone();

        let app = Router::new().route(
            redirect.path(),
            get(move |RawQuery(query): RawQuery| {
                let captured = captured_clone.clone();
                let base = callback_base.clone();
                async move {
                    let full = match query {
                        Some(query) if !query.is_empty() => format!("{base}?{query}"),
                        _ => base,
                    };
                    debug!(url = %full, "authorization callback received");
                    if let Ok(url) = Url::parse(&full) {
                        *captured.lock() = Some(url);
                    }
                    Html(CALLBACK_PAGE)
                }
            }),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!(error = %err, "callback server error");
            }
        });

        if self.launch_browser {
            if let Err(err) = browser::open(url) {
                // Tear the server down before reporting
                let handle = LoopbackHandle::new(captured, shutdown_tx, task);
                handle.close();
                return Err(SurfaceError::Open(err.to_string()));
            }
        }

        Ok(Box::new(LoopbackHandle::new(captured, shutdown_tx, task)))
    }
}

/// Handle over the loopback callback server
pub struct LoopbackHandle {
    captured: Arc<Mutex<Option<Url>>>,
    closed: AtomicBool,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LoopbackHandle {
    fn new(
        captured: Arc<Mutex<Option<Url>>>,
        shutdown_tx: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            captured,
            closed: AtomicBool::new(false),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            task: Mutex::new(Some(task)),
        }
    }

    fn shut_down(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.lock().take() {
            if !task.is_finished() {
                task.abort();
            }
        }
    }
}

impl SurfaceHandle for LoopbackHandle {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn location(&self) -> Option<Url> {
        self.captured.lock().clone()
    }

    fn close(&self) {
        self.shut_down();
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Drop for LoopbackHandle {
    fn drop(&mut self) {
        self.shut_down();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for surface.
    use std::time::Duration;

    use monart_core::{CancelHandle, SurfaceWatcher, WatchOutcome};

    use super::*;

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    /// Validates `LoopbackSurface::open` and callback capture.
    ///
    /// Assertions:
    /// - Ensures the handle starts open with no location.
    /// - Ensures a provider redirect to the callback route becomes
    ///   readable through the handle with its query intact.
    #[tokio::test]
    async fn test_callback_is_captured() {
        let redirect_uri = format!("http://127.0.0.1:{}/callbacks", free_port());
        let surface = LoopbackSurface::new(&redirect_uri).without_browser();

        let handle = surface.open("https://provider.test/authorize").await.unwrap();
        assert!(!handle.is_closed());
        assert!(handle.location().is_none());

        let callback = format!("{redirect_uri}?code=auth_code_1&state=st_1");
        let body = reqwest::get(&callback).await.unwrap().text().await.unwrap();
        assert!(body.contains("Authorization Complete"));

        let location = handle.location().unwrap();
        assert_eq!(location.as_str(), callback);

        handle.close();
        assert!(handle.is_closed());
    }

    /// Validates the surface against the watcher end to end.
    ///
    /// Assertions:
    /// - Confirms the watcher extracts the code and state delivered
    ///   through a real loopback callback.
    #[tokio::test]
    async fn test_watcher_observes_loopback_callback() {
        let redirect_uri = format!("http://127.0.0.1:{}/callbacks", free_port());
        let surface = LoopbackSurface::new(&redirect_uri).without_browser();
        let handle = surface.open("https://provider.test/authorize").await.unwrap();

        let callback = format!("{redirect_uri}?code=auth_code_1&state=st_1");
        tokio::spawn(async move {
            let _ = reqwest::get(&callback).await;
        });

        let watcher = SurfaceWatcher::new(
            redirect_uri,
            Duration::from_millis(10),
            Duration::from_secs(5),
        );
        let outcome = watcher.watch(handle.as_ref(), &CancelHandle::new()).await;

        match outcome {
            WatchOutcome::Matched(params) => {
                assert_eq!(params.code, "auth_code_1");
                assert_eq!(params.state, "st_1");
            }
            other => panic!("expected Matched, got {other:?}"),
        }
        assert!(handle.is_closed());
    }

    /// Validates `open` against an unparseable redirect URI.
    ///
    /// Assertions:
    /// - Ensures the error is reported instead of a panic.
    #[tokio::test]
    async fn test_invalid_redirect_uri_rejected() {
        let surface = LoopbackSurface::new("not a uri").without_browser();
        let result = surface.open("https://provider.test/authorize").await;
        assert!(result.is_err());
    }
}
