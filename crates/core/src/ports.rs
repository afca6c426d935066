//! Port interfaces between the connect/export logic and its collaborators
//!
//! Everything environment-specific (the authorization popup, session
//! storage, the visible controls, image capture, delivery targets) sits
//! behind a trait here so adapters and in-memory fakes are
//! interchangeable.

use std::path::PathBuf;

use async_trait::async_trait;
use monart_domain::{FailureKind, Notice, Profile, TokenExchangeResponse, UserLookupResponse};
use thiserror::Error;
use url::Url;

/// Session-scoped key-value storage
///
/// Holds the cross-step state of a connect attempt: state nonce, code
/// verifier, access credential, connected flag, serialized profile.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Visual state of the connect control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectControlState {
    /// Re-clickable "Connect to Twitter"
    Idle,
    /// Spinner, "Connecting..."
    Connecting,
    /// Spinner, "Fetching data..."
    FetchingData,
    /// Green check, "Connected"
    Connected,
}

/// Export actions, each owning its button's busy state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    Share,
    Copy,
    Download,
}

/// The externally supplied UI surface: connect control, profile panel,
/// export controls, and transient notifications
pub trait ConnectUi: Send + Sync {
    fn set_connect_state(&self, state: ConnectControlState);

    /// Write avatar and display name into the panel and reveal it
    fn show_profile(&self, profile: &Profile);

    fn notify(&self, notice: Notice);

    fn set_export_busy(&self, action: ExportAction, busy: bool);
}

/// A secondary browsing surface opened on the authorization URL
///
/// Mirrors what the popup exposes to the opener: whether it has been
/// closed, and its current location when same-origin readable.
pub trait SurfaceHandle: Send + Sync {
    /// Whether the surface has been closed (by the user or by `close`)
    fn is_closed(&self) -> bool;

    /// Current location, or `None` while it is unreadable (the surface is
    /// still on the identity provider's origin)
    fn location(&self) -> Option<Url>;

    fn close(&self);
}

/// Opens authorization surfaces
#[async_trait]
pub trait AuthorizationSurface: Send + Sync {
    /// Open the authorization URL and return a watchable handle
    async fn open(&self, url: &str) -> Result<Box<dyn SurfaceHandle>, SurfaceError>;
}

/// Failure opening or operating an authorization surface
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to open authorization surface: {0}")]
    Open(String),
}

/// Classified failure from the trusted backend
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// 429 from the backend
    #[error("rate limited by backend")]
    RateLimited,

    /// 5xx from the backend
    #[error("backend server error (status {0})")]
    Server(u16),

    /// Any other non-2xx status
    #[error("backend rejected request (status {0})")]
    Rejected(u16),

    /// Transport-level failure (timeout, connection refused, ...)
    #[error("transport failure: {0}")]
    Transport(String),

    /// 2xx response whose body could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Notification category for this failure
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::RateLimited => FailureKind::RateLimited,
            Self::Server(_) => FailureKind::ServerError,
            Self::Rejected(_) => FailureKind::Rejected,
            Self::Transport(_) => FailureKind::Transport,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

/// The trusted backend: token exchange and profile lookup
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// `POST {backend}/token-exchange` with `{code, code_verifier}`
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenExchangeResponse, GatewayError>;

    /// `GET {backend}/user-lookup` with the credential header
    async fn lookup_user(&self, access_token: &str) -> Result<UserLookupResponse, GatewayError>;
}

/// Card raster produced by the capture port
#[derive(Debug, Clone)]
pub struct CapturedCard {
    /// PNG-encoded image bytes
    pub png: Vec<u8>,
}

/// Failure rendering the card to a raster
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("card capture failed: {0}")]
    Render(String),
    #[error("image encoding failed: {0}")]
    Encode(String),
}

/// Renders the visible card to an encoded raster (the capture library)
#[async_trait]
pub trait CardCapture: Send + Sync {
    async fn capture(&self, profile: &Profile) -> Result<CapturedCard, CaptureError>;
}

/// Failure delivering an exported artifact
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// The delivery channel does not exist in this environment
    #[error("delivery channel unsupported")]
    Unsupported,
    #[error("delivery I/O failed: {0}")]
    Io(String),
    #[error("failed to launch delivery target: {0}")]
    Launch(String),
}

/// File download delivery (the page's anchor-click download)
#[async_trait]
pub trait FileDelivery: Send + Sync {
    /// Persist the card image; returns the written path
    async fn save(&self, png: &[u8]) -> Result<PathBuf, DeliveryError>;
}

/// System clipboard delivery
#[async_trait]
pub trait ClipboardDelivery: Send + Sync {
    async fn copy_image(&self, png: &[u8]) -> Result<(), DeliveryError>;
}

/// Pre-filled social-share compose window
///
/// The raster is attached by convention (the user attaches the downloaded
/// file manually); only text is carried programmatically.
#[async_trait]
pub trait ShareComposer: Send + Sync {
    async fn open_compose(&self, text: &str) -> Result<(), DeliveryError>;
}
