//! In-memory fakes for the port interfaces
//!
//! Used by the unit tests in this crate and reusable from the adapter
//! crates. Mutex poisoning is not a concern here: these types only run
//! inside tests, where a panic fails the test anyway.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use monart_domain::{Notice, Profile, TokenExchangeResponse, UserLookupResponse};
use parking_lot::Mutex;
use url::Url;

use crate::ports::{
    AuthorizationSurface, BackendGateway, CaptureError, CapturedCard, CardCapture,
    ClipboardDelivery, ConnectControlState, ConnectUi, DeliveryError, ExportAction, FileDelivery,
    GatewayError, SessionStore, ShareComposer, SurfaceError, SurfaceHandle,
};

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.data.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.data.lock().remove(key);
    }
}

/// UI fake that records every interaction
#[derive(Debug, Default)]
pub struct RecordingUi {
    states: Mutex<Vec<ConnectControlState>>,
    notices: Mutex<Vec<Notice>>,
    profiles: Mutex<Vec<Profile>>,
    export_busy: Mutex<Vec<(ExportAction, bool)>>,
}

impl RecordingUi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_state(&self) -> Option<ConnectControlState> {
        self.states.lock().last().copied()
    }

    #[must_use]
    pub fn states(&self) -> Vec<ConnectControlState> {
        self.states.lock().clone()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    #[must_use]
    pub fn shown_profiles(&self) -> Vec<Profile> {
        self.profiles.lock().clone()
    }

    #[must_use]
    pub fn export_busy_log(&self) -> Vec<(ExportAction, bool)> {
        self.export_busy.lock().clone()
    }
}

impl ConnectUi for RecordingUi {
    fn set_connect_state(&self, state: ConnectControlState) {
        self.states.lock().push(state);
    }

    fn show_profile(&self, profile: &Profile) {
        self.profiles.lock().push(profile.clone());
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }

    fn set_export_busy(&self, action: ExportAction, busy: bool) {
        self.export_busy.lock().push((action, busy));
    }
}

/// Surface handle that replays a scripted sequence of observations
///
/// Each `is_closed` poll consumes one script entry; `location` reads the
/// entry consumed by the current tick. When the script is exhausted the
/// last entry repeats, unless `close_after_script` was requested.
#[derive(Debug)]
pub struct ScriptedSurfaceHandle {
    locations: Vec<Option<String>>,
    tick: AtomicUsize,
    close_when_exhausted: bool,
    closed: AtomicBool,
    closed_explicitly: AtomicBool,
}

impl ScriptedSurfaceHandle {
    #[must_use]
    pub fn new(locations: Vec<Option<String>>) -> Self {
        Self {
            locations,
            tick: AtomicUsize::new(0),
            close_when_exhausted: false,
            closed: AtomicBool::new(false),
            closed_explicitly: AtomicBool::new(false),
        }
    }

    /// Report the surface as closed once the script runs out
    #[must_use]
    pub fn close_after_script(mut self) -> Self {
        self.close_when_exhausted = true;
        self
    }

    /// A surface that never becomes readable and never closes
    #[must_use]
    pub fn pending_forever() -> Self {
        Self::new(vec![None])
    }

    /// Whether `close` was called on this handle
    #[must_use]
    pub fn was_closed_explicitly(&self) -> bool {
        self.closed_explicitly.load(Ordering::SeqCst)
    }

    fn current_index(&self) -> usize {
        let tick = self.tick.load(Ordering::SeqCst);
        tick.saturating_sub(1).min(self.locations.len().saturating_sub(1))
    }
}

impl SurfaceHandle for ScriptedSurfaceHandle {
    fn is_closed(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return true;
        }
        let tick = self.tick.fetch_add(1, Ordering::SeqCst);
        tick >= self.locations.len() && self.close_when_exhausted
    }

    fn location(&self) -> Option<Url> {
        if self.locations.is_empty() {
            return None;
        }
        let raw = self.locations[self.current_index()].as_deref()?;
        Url::parse(raw).ok()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.closed_explicitly.store(true, Ordering::SeqCst);
    }
}

/// Authorization surface fake returning one prepared handle
#[derive(Default)]
pub struct StubSurface {
    handle: Mutex<Option<ScriptedSurfaceHandle>>,
    opened_urls: Mutex<Vec<String>>,
    fail_open: bool,
}

impl StubSurface {
    #[must_use]
    pub fn with_handle(handle: ScriptedSurfaceHandle) -> Self {
        Self { handle: Mutex::new(Some(handle)), opened_urls: Mutex::new(Vec::new()), fail_open: false }
    }

    /// A surface whose `open` always fails
    #[must_use]
    pub fn failing() -> Self {
        Self { handle: Mutex::new(None), opened_urls: Mutex::new(Vec::new()), fail_open: true }
    }

    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().clone()
    }
}

#[async_trait]
impl AuthorizationSurface for StubSurface {
    async fn open(&self, url: &str) -> Result<Box<dyn SurfaceHandle>, SurfaceError> {
        self.opened_urls.lock().push(url.to_string());
        if self.fail_open {
            return Err(SurfaceError::Open("scripted failure".to_string()));
        }
        self.handle
            .lock()
            .take()
            .map(|handle| Box::new(handle) as Box<dyn SurfaceHandle>)
            .ok_or_else(|| SurfaceError::Open("no scripted handle".to_string()))
    }
}

/// Surface fake that behaves like a well-behaved identity provider
///
/// Parses `redirect_uri` and `state` out of the opened authorization URL
/// and produces a handle that, after one unreadable tick, lands on the
/// callback with the scripted code and the round-tripped state (or an
/// override, for mismatch scenarios).
pub struct EchoSurface {
    code: String,
    state_override: Mutex<Option<String>>,
    opened_urls: Mutex<Vec<String>>,
}

impl EchoSurface {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state_override: Mutex::new(None),
            opened_urls: Mutex::new(Vec::new()),
        }
    }

    /// Return a state different from the one sent, simulating a forged
    /// callback
    #[must_use]
    pub fn with_state_override(self, state: impl Into<String>) -> Self {
        *self.state_override.lock() = Some(state.into());
        self
    }

    #[must_use]
    pub fn opened_urls(&self) -> Vec<String> {
        self.opened_urls.lock().clone()
    }
}

#[async_trait]
impl AuthorizationSurface for EchoSurface {
    async fn open(&self, url: &str) -> Result<Box<dyn SurfaceHandle>, SurfaceError> {
        self.opened_urls.lock().push(url.to_string());

        let parsed = Url::parse(url)
            .map_err(|err| SurfaceError::Open(format!("invalid authorization URL: {err}")))?;
        let mut redirect_uri = None;
        let mut state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "redirect_uri" => redirect_uri = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }
        let redirect_uri = redirect_uri
            .ok_or_else(|| SurfaceError::Open("authorization URL missing redirect_uri".into()))?;
        let state = self
            .state_override
            .lock()
            .clone()
            .or(state)
            .ok_or_else(|| SurfaceError::Open("authorization URL missing state".into()))?;

        let callback = format!("{}?code={}&state={}", redirect_uri, self.code, state);
        Ok(Box::new(ScriptedSurfaceHandle::new(vec![None, Some(callback)])))
    }
}

/// Backend gateway fake with scripted responses
#[derive(Default)]
pub struct StubGateway {
    exchange_result: Mutex<Option<Result<TokenExchangeResponse, GatewayError>>>,
    lookup_result: Mutex<Option<Result<UserLookupResponse, GatewayError>>>,
    exchange_calls: Mutex<Vec<(String, String)>>,
    lookup_calls: Mutex<Vec<String>>,
}

impl StubGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_exchange(&self, result: Result<TokenExchangeResponse, GatewayError>) {
        *self.exchange_result.lock() = Some(result);
    }

    pub fn set_lookup(&self, result: Result<UserLookupResponse, GatewayError>) {
        *self.lookup_result.lock() = Some(result);
    }

    /// `(code, code_verifier)` pairs submitted for exchange
    #[must_use]
    pub fn exchange_calls(&self) -> Vec<(String, String)> {
        self.exchange_calls.lock().clone()
    }

    /// Access tokens submitted for lookup
    #[must_use]
    pub fn lookup_calls(&self) -> Vec<String> {
        self.lookup_calls.lock().clone()
    }
}

#[async_trait]
impl BackendGateway for StubGateway {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenExchangeResponse, GatewayError> {
        self.exchange_calls.lock().push((code.to_string(), code_verifier.to_string()));
        self.exchange_result
            .lock()
            .clone()
            .unwrap_or(Err(GatewayError::Transport("no scripted exchange result".to_string())))
    }

    async fn lookup_user(&self, access_token: &str) -> Result<UserLookupResponse, GatewayError> {
        self.lookup_calls.lock().push(access_token.to_string());
        self.lookup_result
            .lock()
            .clone()
            .unwrap_or(Err(GatewayError::Transport("no scripted lookup result".to_string())))
    }
}

/// Capture fake returning fixed bytes or a scripted failure
#[derive(Default)]
pub struct StubCapture {
    result: Mutex<Option<Result<CapturedCard, CaptureError>>>,
}

impl StubCapture {
    #[must_use]
    pub fn succeeding(png: Vec<u8>) -> Self {
        Self { result: Mutex::new(Some(Ok(CapturedCard { png }))) }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            result: Mutex::new(Some(Err(CaptureError::Render("scripted failure".to_string())))),
        }
    }
}

#[async_trait]
impl CardCapture for StubCapture {
    async fn capture(&self, _profile: &Profile) -> Result<CapturedCard, CaptureError> {
        self.result
            .lock()
            .clone()
            .unwrap_or(Err(CaptureError::Render("no scripted capture result".to_string())))
    }
}

/// File delivery fake recording saved payload sizes
#[derive(Default)]
pub struct StubFileDelivery {
    saved: Mutex<Vec<usize>>,
    fail: bool,
}

impl StubFileDelivery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing() -> Self {
        Self { saved: Mutex::new(Vec::new()), fail: true }
    }

    #[must_use]
    pub fn saved_sizes(&self) -> Vec<usize> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl FileDelivery for StubFileDelivery {
    async fn save(&self, png: &[u8]) -> Result<PathBuf, DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Io("scripted failure".to_string()));
        }
        self.saved.lock().push(png.len());
        Ok(PathBuf::from("monart-card.png"))
    }
}

/// Clipboard fake, optionally unsupported
#[derive(Default)]
pub struct StubClipboard {
    copies: Mutex<Vec<usize>>,
    unsupported: bool,
}

impl StubClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn unsupported() -> Self {
        Self { copies: Mutex::new(Vec::new()), unsupported: true }
    }

    #[must_use]
    pub fn copied_sizes(&self) -> Vec<usize> {
        self.copies.lock().clone()
    }
}

#[async_trait]
impl ClipboardDelivery for StubClipboard {
    async fn copy_image(&self, png: &[u8]) -> Result<(), DeliveryError> {
        if self.unsupported {
            return Err(DeliveryError::Unsupported);
        }
        self.copies.lock().push(png.len());
        Ok(())
    }
}

/// Share composer fake recording compose texts
#[derive(Default)]
pub struct StubComposer {
    texts: Mutex<Vec<String>>,
    fail: bool,
}

impl StubComposer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing() -> Self {
        Self { texts: Mutex::new(Vec::new()), fail: true }
    }

    #[must_use]
    pub fn compose_texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

#[async_trait]
impl ShareComposer for StubComposer {
    async fn open_compose(&self, text: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Launch("scripted failure".to_string()));
        }
        self.texts.lock().push(text.to_string());
        Ok(())
    }
}
