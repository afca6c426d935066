//! # MonArt Infrastructure
//!
//! Adapter implementations of the core ports.
//!
//! This crate contains:
//! - The backend gateway (token exchange + user lookup over HTTP)
//! - The loopback authorization surface (axum callback server + browser)
//! - File-backed session storage
//! - The card compositor and export delivery channels
//! - Configuration loading (environment variables with file fallback)
//!
//! ## Architecture
//! - Implements the port traits defined in `monart-core`
//! - Contains all "impure" code (network, filesystem, processes)

pub mod backend;
pub mod browser;
pub mod card;
pub mod config;
pub mod deliver;
pub mod http;
pub mod store;
pub mod surface;

// Re-export commonly used items
pub use backend::BackendClient;
pub use card::CardCompositor;
pub use config::AppConfig;
pub use deliver::{FileDownloadSink, IntentComposer, SystemClipboard};
pub use http::HttpClient;
pub use store::FileSessionStore;
pub use surface::LoopbackSurface;
