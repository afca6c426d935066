//! # MonArt Core
//!
//! Connect-flow orchestration and card export logic, written against
//! explicit ports so every environment-specific collaborator (the
//! authorization surface, session storage, the UI, card capture) can be
//! swapped for real adapters or in-memory fakes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ ConnectFlow  │  initiator → exchanger → fetcher → renderer
//! └──────┬───────┘
//!        ├──► pkce             (state + proof-of-possession generation)
//!        ├──► SurfaceWatcher   (popup-completion state machine)
//!        ├──► BackendGateway   (token exchange + user lookup, port)
//!        ├──► SessionStore     (key-value session state, port)
//!        └──► ConnectUi        (connect control + notifications, port)
//!
//! ┌──────────────┐
//! │ CardExporter │  capture → encode → deliver (share / copy / download)
//! └──────────────┘
//! ```
//!
//! Control flows strictly downstream; no component calls back upstream.

pub mod connect;
pub mod export;
pub mod pkce;
pub mod ports;
pub mod profile;
pub mod testing;
pub mod watcher;

// Re-export commonly used types
pub use connect::{ConnectFlow, ConnectOutcome};
pub use export::{CardExporter, Delivery, ExportOutcome};
pub use pkce::ProofOfPossession;
pub use ports::{
    AuthorizationSurface, BackendGateway, CaptureError, CapturedCard, CardCapture,
    ClipboardDelivery, ConnectControlState, ConnectUi, DeliveryError, ExportAction, FileDelivery,
    GatewayError, SessionStore, ShareComposer, SurfaceError, SurfaceHandle,
};
pub use watcher::{CancelHandle, SurfaceWatcher, WatchOutcome, WatchState};
