//! Common data types used throughout the application

use serde::{Deserialize, Serialize};

use crate::constants::{PLACEHOLDER_AVATAR_URL, PLACEHOLDER_DISPLAY_NAME, PLACEHOLDER_HANDLE};

/// Displayable user profile rendered into the card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Handle including the `@` prefix (e.g. `@monart_cards`)
    pub handle: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl Profile {
    /// Fixed fallback profile used whenever live data cannot be obtained
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            handle: PLACEHOLDER_HANDLE.to_string(),
            display_name: PLACEHOLDER_DISPLAY_NAME.to_string(),
            avatar_url: PLACEHOLDER_AVATAR_URL.to_string(),
        }
    }

    /// Whether this is the placeholder profile
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.handle == PLACEHOLDER_HANDLE && self.display_name == PLACEHOLDER_DISPLAY_NAME
    }
}

/// User payload returned by the backend user-lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendUser {
    pub username: Option<String>,
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Response body of the backend token-exchange endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExchangeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Response body of the backend user-lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLookupResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<BackendUser>,
}

/// Query parameters extracted from the authorization callback location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// Classified failure raised by a connect-flow stage
///
/// Each kind maps to a distinct user-facing notification; none of them
/// block the flow beyond the stage that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Required configuration (client id, redirect target, scopes) missing
    ConfigMissing,
    /// Callback state did not match the stored session secret
    StateMismatch,
    /// Callback reached without the expected code/state parameters
    MalformedCallback,
    /// Backend answered 429
    RateLimited,
    /// Backend answered with a 5xx status
    ServerError,
    /// Any other non-2xx status
    Rejected,
    /// Transport-level failure (timeout, connection refused, ...)
    Transport,
    /// 2xx response whose body could not be interpreted
    MalformedResponse,
}

impl FailureKind {
    /// User-facing message for this failure category
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ConfigMissing => {
                "Twitter API configuration not found. Please check your configuration."
            }
            Self::StateMismatch => "OAuth state verification failed. Security error.",
            Self::MalformedCallback => "Twitter callback parameters not found.",
            Self::RateLimited => {
                "API rate limit exceeded (429). Too many requests. Using demo data. \
                 Please wait a few minutes and try again."
            }
            Self::ServerError => {
                "Server temporarily unavailable (5xx error). Using demo data. \
                 Please try again later."
            }
            Self::Rejected | Self::Transport => {
                "Connection failed. This may be due to rate limiting or server issues. \
                 Using demo data. Please try again later."
            }
            Self::MalformedResponse => "Token exchange failed. Using mock data.",
        }
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

/// A user-facing notification emitted by the flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self { severity: Severity::Success, message: message.into() }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, message: message.into() }
    }

    #[must_use]
    pub fn danger(message: impl Into<String>) -> Self {
        Self { severity: Severity::Danger, message: message.into() }
    }
}
