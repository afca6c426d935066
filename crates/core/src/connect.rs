//! Connect-flow orchestrator
//!
//! Drives the three sequential stages of a connect attempt: authorization
//! initiation (surface + watcher), token exchange through the trusted
//! backend, and profile fetch/render. Each stage resolves to a linear
//! result the orchestrator pattern-matches on; failure paths end in the
//! placeholder profile or an idle UI, never a stuck control.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use monart_domain::constants::{KEY_ACCESS_TOKEN, KEY_CODE_VERIFIER, KEY_OAUTH_STATE};
use monart_domain::{CallbackParams, ConnectConfig, FailureKind, Notice, Profile};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::pkce::{self, ProofOfPossession};
use crate::ports::{
    AuthorizationSurface, BackendGateway, ConnectControlState, ConnectUi, SessionStore,
};
use crate::profile::{profile_from_user, render_profile};
use crate::watcher::{CancelHandle, SurfaceWatcher, WatchOutcome};

/// Terminal result of a connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Flow completed and a profile (live or placeholder) was rendered
    Connected(Profile),
    /// User closed the surface (or the watch timed out) before authorizing
    Cancelled,
    /// Attempt aborted before the exchange stage
    Aborted(FailureKind),
    /// Another attempt is already in flight; this one was ignored
    AlreadyRunning,
}

/// Result of the authorization stage
enum Authorization {
    Granted(CallbackParams),
    Cancelled,
    Failed(FailureKind),
}

/// Orchestrates initiator → exchanger → fetcher → renderer
pub struct ConnectFlow {
    config: ConnectConfig,
    store: Arc<dyn SessionStore>,
    ui: Arc<dyn ConnectUi>,
    surface: Arc<dyn AuthorizationSurface>,
    backend: Arc<dyn BackendGateway>,
    cancel: Mutex<CancelHandle>,
    in_flight: AtomicBool,
}

impl ConnectFlow {
    #[must_use]
    pub fn new(
        config: ConnectConfig,
        store: Arc<dyn SessionStore>,
        ui: Arc<dyn ConnectUi>,
        surface: Arc<dyn AuthorizationSurface>,
        backend: Arc<dyn BackendGateway>,
    ) -> Self {
        Self {
            config,
            store,
            ui,
            surface,
            backend,
            cancel: Mutex::new(CancelHandle::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one connect attempt
    ///
    /// Re-entrant calls while an attempt is in flight are ignored and
    /// return [`ConnectOutcome::AlreadyRunning`] without touching UI or
    /// stored state.
    pub async fn connect(&self) -> ConnectOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("connect attempt ignored; another is already in flight");
            return ConnectOutcome::AlreadyRunning;
        }

        let outcome = self.run().await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    /// Cancel the watch of the attempt currently in flight, if any
    pub fn cancel(&self) {
        self.cancel.lock().cancel();
    }

    async fn run(&self) -> ConnectOutcome {
        let params = match self.authorize().await {
            Authorization::Granted(params) => params,
            Authorization::Cancelled => return ConnectOutcome::Cancelled,
            Authorization::Failed(kind) => return ConnectOutcome::Aborted(kind),
        };

        let credential = self.exchange(&params).await;
        let profile = self.fetch_profile(credential.as_deref()).await;
        render_profile(self.ui.as_ref(), self.store.as_ref(), &profile);

        info!(placeholder = profile.is_placeholder(), "connect flow completed");
        ConnectOutcome::Connected(profile)
    }

    /// Stage 1: build the authorization request, open the surface, watch
    /// for completion, and verify the round-tripped state.
    async fn authorize(&self) -> Authorization {
        if let Err(err) = self.config.validate() {
            warn!(error = %err, "configuration incomplete; attempt abandoned");
            self.ui.notify(Notice::danger(FailureKind::ConfigMissing.user_message()));
            self.ui.set_connect_state(ConnectControlState::Idle);
            return Authorization::Failed(FailureKind::ConfigMissing);
        }

        self.ui.set_connect_state(ConnectControlState::Connecting);

        let state = pkce::generate_state();
        let pop = ProofOfPossession::generate(self.config.challenge_method);
        self.store.set(KEY_OAUTH_STATE, &state);
        self.store.set(KEY_CODE_VERIFIER, &pop.verifier);

        let url = build_authorize_url(&self.config, &state, &pop);
        debug!(endpoint = %self.config.authorize_endpoint, "opening authorization surface");

        let handle = match self.surface.open(&url).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(error = %err, "failed to open authorization surface");
                self.ui.notify(Notice::danger(FailureKind::Transport.user_message()));
                self.ui.set_connect_state(ConnectControlState::Idle);
                return Authorization::Failed(FailureKind::Transport);
            }
        };

        let cancel = CancelHandle::new();
        *self.cancel.lock() = cancel.clone();

        let watcher = SurfaceWatcher::new(
            self.config.redirect_uri.clone(),
            Duration::from_millis(self.config.poll_interval_ms),
            Duration::from_secs(self.config.watch_timeout_secs),
        );

        match watcher.watch(handle.as_ref(), &cancel).await {
            WatchOutcome::Matched(params) => {
                // The stored state is consumed exactly once, match or not.
                let expected = self.store.get(KEY_OAUTH_STATE);
                self.store.remove(KEY_OAUTH_STATE);

                if expected.as_deref() == Some(params.state.as_str()) {
                    Authorization::Granted(params)
                } else {
                    warn!("callback state did not match stored session secret");
                    self.ui.notify(Notice::danger(FailureKind::StateMismatch.user_message()));
                    self.ui.set_connect_state(ConnectControlState::Idle);
                    Authorization::Failed(FailureKind::StateMismatch)
                }
            }
            WatchOutcome::Closed | WatchOutcome::TimedOut | WatchOutcome::Cancelled => {
                self.ui.set_connect_state(ConnectControlState::Idle);
                Authorization::Cancelled
            }
            WatchOutcome::MalformedCallback => {
                self.ui.notify(Notice::danger(FailureKind::MalformedCallback.user_message()));
                self.ui.set_connect_state(ConnectControlState::Idle);
                Authorization::Failed(FailureKind::MalformedCallback)
            }
        }
    }

    /// Stage 2: exchange the authorization code for a bearer credential.
    ///
    /// Every failure is classified, surfaced as a notification, and falls
    /// through to stage 3 with no credential; the flow never dead-ends.
    async fn exchange(&self, params: &CallbackParams) -> Option<String> {
        let verifier = self.store.get(KEY_CODE_VERIFIER).unwrap_or_default();

        match self.backend.exchange_code(&params.code, &verifier).await {
            Ok(response) => match response.access_token.filter(|_| response.success) {
                Some(token) if !token.is_empty() => {
                    self.store.set(KEY_ACCESS_TOKEN, &token);
                    self.ui.notify(Notice::success(
                        "Your Twitter account has been successfully connected!",
                    ));
                    Some(token)
                }
                _ => {
                    warn!("token exchange answered without a usable credential");
                    self.ui
                        .notify(Notice::warning(FailureKind::MalformedResponse.user_message()));
                    None
                }
            },
            Err(err) => {
                warn!(error = %err, "token exchange failed");
                self.ui.notify(Notice::danger(err.failure_kind().user_message()));
                None
            }
        }
    }

    /// Stage 3: resolve the profile, substituting the placeholder whenever
    /// live data cannot be obtained.
    async fn fetch_profile(&self, credential: Option<&str>) -> Profile {
        self.ui.set_connect_state(ConnectControlState::FetchingData);

        let Some(token) = credential else {
            debug!("no credential; using placeholder profile");
            return Profile::placeholder();
        };

        match self.backend.lookup_user(token).await {
            Ok(response) => match response.user.filter(|_| response.success) {
                Some(user) => profile_from_user(user),
                None => {
                    warn!("user lookup answered without a user payload");
                    Profile::placeholder()
                }
            },
            Err(err) => {
                warn!(error = %err, "user lookup failed");
                self.ui.notify(Notice::danger(err.failure_kind().user_message()));
                Profile::placeholder()
            }
        }
    }
}

/// Build the authorization URL with the fixed request fields
#[must_use]
pub fn build_authorize_url(
    config: &ConnectConfig,
    state: &str,
    pop: &ProofOfPossession,
) -> String {
    let scope = config.scope_string();
    let params = [
        ("response_type", "code"),
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("scope", scope.as_str()),
        ("state", state),
        ("code_challenge", pop.challenge.as_str()),
        ("code_challenge_method", pop.method_param()),
    ];

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", config.authorize_endpoint, query)
}

#[cfg(test)]
mod tests {
    //! Unit tests for connect.
    use monart_domain::constants::{KEY_CONNECTED, KEY_PROFILE};
    use monart_domain::{
        BackendUser, ChallengeMethod, Severity, TokenExchangeResponse, UserLookupResponse,
    };

    use super::*;
    use crate::ports::GatewayError;
    use crate::testing::{
        EchoSurface, MemorySessionStore, RecordingUi, ScriptedSurfaceHandle, StubGateway,
        StubSurface,
    };

    struct Harness {
        store: Arc<MemorySessionStore>,
        ui: Arc<RecordingUi>,
        gateway: Arc<StubGateway>,
    }

    fn config() -> ConnectConfig {
        ConnectConfig {
            client_id: "client_123".to_string(),
            redirect_uri: "https://monart.cards/callbacks".to_string(),
            scopes: vec![
                "tweet.read".to_string(),
                "users.read".to_string(),
                "offline.access".to_string(),
            ],
            authorize_endpoint: "https://twitter.com/i/oauth2/authorize".to_string(),
            backend_url: "https://monartcards.vercel.app/api".to_string(),
            challenge_method: ChallengeMethod::Plain,
            poll_interval_ms: 2,
            watch_timeout_secs: 5,
        }
    }

    fn flow_with(surface: Arc<dyn AuthorizationSurface>) -> (ConnectFlow, Harness) {
        let store = Arc::new(MemorySessionStore::new());
        let ui = Arc::new(RecordingUi::new());
        let gateway = Arc::new(StubGateway::new());

        let flow = ConnectFlow::new(
            config(),
            store.clone(),
            ui.clone(),
            surface,
            gateway.clone(),
        );

        (flow, Harness { store, ui, gateway })
    }

    fn successful_exchange(gateway: &StubGateway) {
        gateway.set_exchange(Ok(TokenExchangeResponse {
            success: true,
            access_token: Some("tok_live".to_string()),
        }));
    }

    fn successful_lookup(gateway: &StubGateway) {
        gateway.set_lookup(Ok(UserLookupResponse {
            success: true,
            user: Some(BackendUser {
                username: Some("alice".to_string()),
                name: Some("Alice".to_string()),
                profile_image_url: Some("https://pbs.twimg.com/a_normal.jpg".to_string()),
            }),
        }));
    }

    /// Validates the full happy path through all three stages.
    ///
    /// Assertions:
    /// - Confirms the rendered profile matches the backend payload with
    ///   `_normal` rewritten to `_400x400`.
    /// - Ensures the exchange received the stored code verifier.
    /// - Ensures the session store holds the credential, connected flag,
    ///   and serialized profile.
    #[tokio::test]
    async fn test_happy_path_renders_live_profile() {
        let surface = Arc::new(EchoSurface::new("auth_code_1"));
        let (flow, h) = flow_with(surface.clone());
        successful_exchange(&h.gateway);
        successful_lookup(&h.gateway);

        let outcome = flow.connect().await;

        let ConnectOutcome::Connected(profile) = outcome else {
            panic!("expected Connected, got {outcome:?}");
        };
        assert_eq!(profile.handle, "@alice");
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.avatar_url, "https://pbs.twimg.com/a_400x400.jpg");

        // Exchange carried the code and the stored verifier
        let calls = h.gateway.exchange_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "auth_code_1");
        assert_eq!(h.store.get(KEY_CODE_VERIFIER).as_deref(), Some(calls[0].1.as_str()));

        // Lookup used the exchanged credential
        assert_eq!(h.gateway.lookup_calls(), vec!["tok_live".to_string()]);
        assert_eq!(h.store.get(KEY_ACCESS_TOKEN).as_deref(), Some("tok_live"));

        // Session state and UI reflect the connected profile
        assert_eq!(h.store.get(KEY_CONNECTED).as_deref(), Some("true"));
        assert!(h.store.get(KEY_PROFILE).is_some());
        assert_eq!(h.ui.last_state(), Some(ConnectControlState::Connected));
        assert_eq!(h.ui.shown_profiles(), vec![profile]);
    }

    /// Validates the authorization URL carries the fixed request fields.
    ///
    /// Assertions:
    /// - Ensures response type, client id, scopes, state, and the plain
    ///   challenge method are all present.
    #[tokio::test]
    async fn test_authorize_url_fields() {
        let surface = Arc::new(EchoSurface::new("c"));
        let (flow, h) = flow_with(surface.clone());
        successful_exchange(&h.gateway);
        successful_lookup(&h.gateway);

        flow.connect().await;

        let urls = surface.opened_urls();
        assert_eq!(urls.len(), 1);
        let url = &urls[0];
        assert!(url.starts_with("https://twitter.com/i/oauth2/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client_123"));
        assert!(url.contains("scope=tweet.read%20users.read%20offline.access"));
        assert!(url.contains("code_challenge="));
        assert!(url.contains("code_challenge_method=plain"));
    }

    /// Validates the state-mismatch security failure.
    ///
    /// Assertions:
    /// - Ensures the attempt aborts with `StateMismatch`, the UI resets to
    ///   idle, and no exchange is attempted.
    /// - Ensures the stored state was consumed.
    #[tokio::test]
    async fn test_state_mismatch_aborts_attempt() {
        let surface = Arc::new(EchoSurface::new("c").with_state_override("forged_state"));
        let (flow, h) = flow_with(surface);

        let outcome = flow.connect().await;

        assert_eq!(outcome, ConnectOutcome::Aborted(FailureKind::StateMismatch));
        assert_eq!(h.ui.last_state(), Some(ConnectControlState::Idle));
        assert!(h.gateway.exchange_calls().is_empty());
        assert!(h.store.get(KEY_OAUTH_STATE).is_none());

        let notices = h.ui.notices();
        assert!(notices
            .iter()
            .any(|n| n.severity == Severity::Danger && n.message.contains("Security error")));
    }

    /// Validates the user-cancellation path.
    ///
    /// Assertions:
    /// - Ensures a surface closed before redirect reverts the control to
    ///   idle and produces no notification.
    #[tokio::test]
    async fn test_closed_surface_reverts_to_idle() {
        let handle = ScriptedSurfaceHandle::new(vec![None]).close_after_script();
        let surface = Arc::new(StubSurface::with_handle(handle));
        let (flow, h) = flow_with(surface);

        let outcome = flow.connect().await;

        assert_eq!(outcome, ConnectOutcome::Cancelled);
        assert_eq!(h.ui.last_state(), Some(ConnectControlState::Idle));
        assert!(h.ui.notices().is_empty());
        assert!(h.gateway.exchange_calls().is_empty());
    }

    /// Validates the missing-configuration failure.
    ///
    /// Assertions:
    /// - Ensures the attempt aborts with `ConfigMissing`, a danger notice,
    ///   and an idle control; the surface is never opened.
    #[tokio::test]
    async fn test_missing_config_fails_visibly() {
        let surface = Arc::new(StubSurface::failing());
        let store = Arc::new(MemorySessionStore::new());
        let ui = Arc::new(RecordingUi::new());
        let gateway = Arc::new(StubGateway::new());

        let mut cfg = config();
        cfg.client_id = String::new();
        let flow = ConnectFlow::new(cfg, store, ui.clone(), surface.clone(), gateway);

        let outcome = flow.connect().await;

        assert_eq!(outcome, ConnectOutcome::Aborted(FailureKind::ConfigMissing));
        assert_eq!(ui.last_state(), Some(ConnectControlState::Idle));
        assert!(surface.opened_urls().is_empty());
        assert!(ui
            .notices()
            .iter()
            .any(|n| n.severity == Severity::Danger && n.message.contains("configuration")));
    }

    /// Validates the rate-limited exchange fallback.
    ///
    /// Assertions:
    /// - Ensures a 429 produces the rate-limit-specific notification.
    /// - Ensures the flow still completes with the placeholder profile and
    ///   the panel revealed.
    #[tokio::test]
    async fn test_rate_limited_exchange_falls_back_to_placeholder() {
        let surface = Arc::new(EchoSurface::new("c"));
        let (flow, h) = flow_with(surface);
        h.gateway.set_exchange(Err(GatewayError::RateLimited));

        let outcome = flow.connect().await;

        assert_eq!(outcome, ConnectOutcome::Connected(Profile::placeholder()));
        assert_eq!(h.ui.shown_profiles(), vec![Profile::placeholder()]);
        assert_eq!(h.ui.last_state(), Some(ConnectControlState::Connected));
        assert!(h.gateway.lookup_calls().is_empty());

        let notices = h.ui.notices();
        assert!(notices.iter().any(|n| n.message.contains("429")));
        assert!(!notices.iter().any(|n| n.message.contains("5xx")));
    }

    /// Validates the failed-lookup fallback.
    ///
    /// Assertions:
    /// - Ensures a server error during lookup still yields the placeholder
    ///   profile with a server-specific notification.
    #[tokio::test]
    async fn test_failed_lookup_falls_back_to_placeholder() {
        let surface = Arc::new(EchoSurface::new("c"));
        let (flow, h) = flow_with(surface);
        successful_exchange(&h.gateway);
        h.gateway.set_lookup(Err(GatewayError::Server(503)));

        let outcome = flow.connect().await;

        assert_eq!(outcome, ConnectOutcome::Connected(Profile::placeholder()));
        assert!(h.ui.notices().iter().any(|n| n.message.contains("5xx")));
    }

    /// Validates the malformed exchange payload fallback.
    ///
    /// Assertions:
    /// - Ensures a success-shaped response without a credential produces a
    ///   warning and the placeholder profile.
    #[tokio::test]
    async fn test_exchange_without_credential_uses_placeholder() {
        let surface = Arc::new(EchoSurface::new("c"));
        let (flow, h) = flow_with(surface);
        h.gateway.set_exchange(Ok(TokenExchangeResponse { success: false, access_token: None }));

        let outcome = flow.connect().await;

        assert_eq!(outcome, ConnectOutcome::Connected(Profile::placeholder()));
        assert!(h.store.get(KEY_ACCESS_TOKEN).is_none());
        assert!(h.ui.notices().iter().any(|n| n.severity == Severity::Warning));
    }

    /// Validates the overlapping-attempt guard.
    ///
    /// Assertions:
    /// - Ensures a second `connect` while one is in flight returns
    ///   `AlreadyRunning` without side effects.
    /// - Ensures cancelling resolves the first attempt as `Cancelled`.
    #[tokio::test]
    async fn test_overlapping_attempts_are_ignored() {
        let handle = ScriptedSurfaceHandle::pending_forever();
        let surface = Arc::new(StubSurface::with_handle(handle));
        let (flow, h) = flow_with(surface);
        let flow = Arc::new(flow);

        let first = tokio::spawn({
            let flow = flow.clone();
            async move { flow.connect().await }
        });

        // Let the first attempt reach its watch loop
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = flow.connect().await;
        assert_eq!(second, ConnectOutcome::AlreadyRunning);

        flow.cancel();
        let first = first.await.unwrap();
        assert_eq!(first, ConnectOutcome::Cancelled);
        assert_eq!(h.ui.last_state(), Some(ConnectControlState::Idle));
    }
}
