//! # MonArt Domain
//!
//! Business domain types and models for the MonArt Cards connect flow.
//!
//! This crate contains:
//! - Domain data types (Profile, backend payloads, callback parameters)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other MonArt crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::{ChallengeMethod, ConnectConfig, ExportConfig};
pub use errors::{MonartError, Result};
pub use types::{
    BackendUser, CallbackParams, FailureKind, Notice, Profile, Severity, TokenExchangeResponse,
    UserLookupResponse,
};
