//! Profile mapping, avatar normalization, and rendering
//!
//! Maps backend user payloads into the displayable [`Profile`], substitutes
//! the fixed placeholder when live data is unavailable, and writes the
//! result through the UI and session-store ports.

use chrono::Utc;
use monart_domain::constants::{
    AVATAR_HIGH_RES_MARKER, AVATAR_LOW_RES_MARKER, KEY_CONNECTED, KEY_CONNECTED_AT, KEY_PROFILE,
    PLACEHOLDER_AVATAR_URL, PLACEHOLDER_DISPLAY_NAME, PLACEHOLDER_HANDLE,
};
use monart_domain::{BackendUser, Profile};
use tracing::warn;

use crate::ports::{ConnectControlState, ConnectUi, SessionStore};

/// Rewrite a known low-resolution avatar marker to its high-resolution
/// variant
///
/// Twitter serves `..._normal.jpg` thumbnails; the card wants the
/// `..._400x400.jpg` rendition. URLs without the marker pass through
/// unchanged.
#[must_use]
pub fn normalize_avatar_url(url: &str) -> String {
    if url.contains(AVATAR_LOW_RES_MARKER) {
        url.replacen(AVATAR_LOW_RES_MARKER, AVATAR_HIGH_RES_MARKER, 1)
    } else {
        url.to_string()
    }
}

/// Map a backend user payload into a displayable profile
///
/// Missing fields fall back to the corresponding placeholder values, each
/// field defaulted independently.
#[must_use]
pub fn profile_from_user(user: BackendUser) -> Profile {
    let handle = match user.username {
        Some(username) if !username.is_empty() => format!("@{username}"),
        _ => PLACEHOLDER_HANDLE.to_string(),
    };
    let display_name = match user.name {
        Some(name) if !name.is_empty() => name,
        _ => PLACEHOLDER_DISPLAY_NAME.to_string(),
    };
    let avatar_url = match user.profile_image_url {
        Some(url) if !url.is_empty() => normalize_avatar_url(&url),
        _ => PLACEHOLDER_AVATAR_URL.to_string(),
    };

    Profile { handle, display_name, avatar_url }
}

/// Render the profile and record the connected session state
///
/// Reveals the profile panel, switches the connect control to its
/// connected visual, and persists the connected flag plus the serialized
/// profile for the remainder of the session. Never fails: a profile that
/// cannot be serialized is logged and skipped.
pub fn render_profile(ui: &dyn ConnectUi, store: &dyn SessionStore, profile: &Profile) {
    ui.show_profile(profile);
    ui.set_connect_state(ConnectControlState::Connected);

    store.set(KEY_CONNECTED, "true");
    store.set(KEY_CONNECTED_AT, &Utc::now().to_rfc3339());
    match serde_json::to_string(profile) {
        Ok(json) => store.set(KEY_PROFILE, &json),
        Err(err) => warn!(error = %err, "failed to serialize profile for session storage"),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for profile.
    use super::*;
    use crate::testing::{MemorySessionStore, RecordingUi};

    /// Validates `normalize_avatar_url` behavior.
    ///
    /// Assertions:
    /// - Confirms `_normal` is rewritten to `_400x400`.
    /// - Ensures URLs without the marker pass through unchanged.
    /// - Ensures only the first occurrence is rewritten.
    #[test]
    fn test_avatar_normalization() {
        assert_eq!(
            normalize_avatar_url("https://pbs.twimg.com/profile_images/1/x_normal.jpg"),
            "https://pbs.twimg.com/profile_images/1/x_400x400.jpg"
        );
        assert_eq!(
            normalize_avatar_url("https://pbs.twimg.com/profile_images/1/x_bigger.jpg"),
            "https://pbs.twimg.com/profile_images/1/x_bigger.jpg"
        );
        assert_eq!(
            normalize_avatar_url("https://x.test/a_normal/b_normal.jpg"),
            "https://x.test/a_400x400/b_normal.jpg"
        );
    }

    /// Validates `profile_from_user` for a complete payload.
    ///
    /// Assertions:
    /// - Confirms the `@` handle prefix and normalized avatar URL.
    #[test]
    fn test_profile_from_complete_user() {
        let profile = profile_from_user(BackendUser {
            username: Some("alice".to_string()),
            name: Some("Alice".to_string()),
            profile_image_url: Some("https://pbs.twimg.com/a_normal.jpg".to_string()),
        });

        assert_eq!(profile.handle, "@alice");
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.avatar_url, "https://pbs.twimg.com/a_400x400.jpg");
    }

    /// Validates `profile_from_user` field-wise fallback.
    ///
    /// Assertions:
    /// - Ensures each missing field independently falls back to its
    ///   placeholder value.
    #[test]
    fn test_profile_from_partial_user() {
        let profile = profile_from_user(BackendUser {
            username: None,
            name: Some("Alice".to_string()),
            profile_image_url: None,
        });

        assert_eq!(profile.handle, "@monart_cards");
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.avatar_url, "https://picsum.photos/300/300?random=1");
    }

    /// Validates `render_profile` UI and session-store effects.
    ///
    /// Assertions:
    /// - Ensures the panel shows the profile and the control reads
    ///   connected.
    /// - Ensures the connected flag and serialized profile are stored.
    #[test]
    fn test_render_profile_records_session_state() {
        let ui = RecordingUi::new();
        let store = MemorySessionStore::new();
        let profile = Profile::placeholder();

        render_profile(&ui, &store, &profile);

        assert_eq!(ui.shown_profiles(), vec![profile.clone()]);
        assert_eq!(ui.last_state(), Some(ConnectControlState::Connected));
        assert_eq!(store.get(KEY_CONNECTED).as_deref(), Some("true"));
        assert!(store.get(KEY_CONNECTED_AT).is_some());

        let stored: Profile =
            serde_json::from_str(&store.get(KEY_PROFILE).unwrap()).unwrap();
        assert_eq!(stored, profile);
    }
}
