//! Configuration structures for the connect flow and card export

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CARD_FILE_NAME, SHARE_TEXT, SHARE_TEXT_WITH_IMAGE, SURFACE_POLL_INTERVAL_MS,
    SURFACE_WATCH_TIMEOUT_SECS,
};
use crate::errors::{MonartError, Result};

/// Policy for deriving the `code_challenge` sent with the authorization
/// request.
///
/// The deployed MonArt backend verifies the challenge as an opaque string
/// (`plain`), so that is the default. `S256` implements the RFC 7636 digest
/// for backends that verify a hashed challenge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeMethod {
    #[default]
    Plain,
    S256,
}

impl ChallengeMethod {
    /// Value of the `code_challenge_method` authorization parameter
    #[must_use]
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

/// Configuration for the OAuth connect flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// OAuth client id registered with the identity provider
    pub client_id: String,

    /// Redirect target registered with the identity provider; the surface
    /// watcher treats a location under this URI as the callback
    pub redirect_uri: String,

    /// Scopes requested at authorization (joined with spaces)
    pub scopes: Vec<String>,

    /// Identity provider authorization endpoint
    pub authorize_endpoint: String,

    /// Base URL of the trusted backend (token exchange + user lookup)
    pub backend_url: String,

    /// Challenge derivation policy
    #[serde(default)]
    pub challenge_method: ChallengeMethod,

    /// Interval between surface polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall deadline for the surface watch, in seconds
    #[serde(default = "default_watch_timeout_secs")]
    pub watch_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    SURFACE_POLL_INTERVAL_MS
}

fn default_watch_timeout_secs() -> u64 {
    SURFACE_WATCH_TIMEOUT_SECS
}

impl ConnectConfig {
    /// Verify that the fields required to start an authorization attempt are
    /// present.
    ///
    /// # Errors
    /// Returns `MonartError::Config` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(MonartError::Config("client_id is missing".to_string()));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(MonartError::Config("redirect_uri is missing".to_string()));
        }
        if self.scopes.is_empty() {
            return Err(MonartError::Config("scope list is empty".to_string()));
        }
        if self.authorize_endpoint.trim().is_empty() {
            return Err(MonartError::Config("authorize_endpoint is missing".to_string()));
        }
        if self.backend_url.trim().is_empty() {
            return Err(MonartError::Config("backend_url is missing".to_string()));
        }
        Ok(())
    }

    /// Scopes as the space-separated `scope` parameter value
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Configuration for card export delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the download delivery writes the card image to
    pub download_dir: PathBuf,

    /// File name of the exported card image
    #[serde(default = "default_card_file_name")]
    pub file_name: String,

    /// Compose-window text for the text-only share fallback
    #[serde(default = "default_share_text")]
    pub share_text: String,

    /// Compose-window text used after the card image was saved for manual
    /// attachment
    #[serde(default = "default_share_text_with_image")]
    pub share_text_with_image: String,
}

fn default_card_file_name() -> String {
    CARD_FILE_NAME.to_string()
}

fn default_share_text() -> String {
    SHARE_TEXT.to_string()
}

fn default_share_text_with_image() -> String {
    SHARE_TEXT_WITH_IMAGE.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            file_name: default_card_file_name(),
            share_text: default_share_text(),
            share_text_with_image: default_share_text_with_image(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    use super::*;

    fn valid_config() -> ConnectConfig {
        ConnectConfig {
            client_id: "client_123".to_string(),
            redirect_uri: "https://monart.cards/callbacks".to_string(),
            scopes: vec!["tweet.read".to_string(), "users.read".to_string()],
            authorize_endpoint: "https://twitter.com/i/oauth2/authorize".to_string(),
            backend_url: "https://monartcards.vercel.app/api".to_string(),
            challenge_method: ChallengeMethod::default(),
            poll_interval_ms: 500,
            watch_timeout_secs: 300,
        }
    }

    /// Validates `ConnectConfig::validate` behavior for the complete
    /// configuration scenario.
    ///
    /// Assertions:
    /// - Ensures validation passes and the scope string is space-joined.
    #[test]
    fn test_valid_config_passes() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.scope_string(), "tweet.read users.read");
    }

    /// Validates `ConnectConfig::validate` behavior for missing fields.
    ///
    /// Assertions:
    /// - Ensures a missing client id, empty scope list, and blank redirect
    ///   each produce a `Config` error.
    #[test]
    fn test_missing_fields_rejected() {
        let mut config = valid_config();
        config.client_id = String::new();
        assert!(matches!(config.validate(), Err(MonartError::Config(_))));

        let mut config = valid_config();
        config.scopes.clear();
        assert!(matches!(config.validate(), Err(MonartError::Config(_))));

        let mut config = valid_config();
        config.redirect_uri = "   ".to_string();
        assert!(matches!(config.validate(), Err(MonartError::Config(_))));
    }

    /// Validates `ChallengeMethod` defaults and parameter values.
    ///
    /// Assertions:
    /// - Confirms the default method is `plain` (matches the deployed
    ///   backend's protocol shape).
    /// - Confirms the S256 parameter value.
    #[test]
    fn test_challenge_method_params() {
        assert_eq!(ChallengeMethod::default().as_param(), "plain");
        assert_eq!(ChallengeMethod::S256.as_param(), "S256");
    }
}
