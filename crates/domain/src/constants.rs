//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! connect flow and card export.

// Session store keys
pub const KEY_OAUTH_STATE: &str = "oauth_state";
pub const KEY_CODE_VERIFIER: &str = "code_verifier";
pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_CONNECTED: &str = "connected";
pub const KEY_CONNECTED_AT: &str = "connected_at";
pub const KEY_PROFILE: &str = "profile";

// Surface watcher configuration
pub const SURFACE_POLL_INTERVAL_MS: u64 = 500;
pub const SURFACE_WATCH_TIMEOUT_SECS: u64 = 300;

// Placeholder profile, rendered whenever live data cannot be obtained
pub const PLACEHOLDER_HANDLE: &str = "@monart_cards";
pub const PLACEHOLDER_DISPLAY_NAME: &str = "MonArt Cards";
pub const PLACEHOLDER_AVATAR_URL: &str = "https://picsum.photos/300/300?random=1";

// Avatar URL resolution markers
pub const AVATAR_LOW_RES_MARKER: &str = "_normal";
pub const AVATAR_HIGH_RES_MARKER: &str = "_400x400";

// Card export
pub const CARD_FILE_NAME: &str = "monart-card.png";
pub const SHARE_TEXT: &str = "This is my Monart Card and I'm part of the Monart Cards community! \
    If you want to print your Monart Cards, do it now! https://monart.cards/\n\n\
    Monad belongs to the people! @monad 💜";
pub const SHARE_TEXT_WITH_IMAGE: &str =
    "This is my Monart Card and I'm part of the Monad community! \
    If you want to print your Monart Cards, do it now! https://monart.cards/\n\n\
    Monad belongs to the people! @monad 💜\n\n\
    📸 Image downloaded - add it to your tweet!";
pub const SHARE_COMPOSE_ENDPOINT: &str = "https://twitter.com/intent/tweet";
