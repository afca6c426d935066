//! Terminal rendering of the connect UI
//!
//! The connect button, profile panel, and toast notifications collapse to
//! structured log lines here; the state transitions are the same ones a
//! graphical adapter would drive.

use monart_core::ports::{ConnectControlState, ConnectUi, ExportAction};
use monart_domain::{Notice, Profile, Severity};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
pub struct TerminalUi;

impl TerminalUi {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ConnectUi for TerminalUi {
    fn set_connect_state(&self, state: ConnectControlState) {
        let label = match state {
            ConnectControlState::Idle => "Connect to Twitter",
            ConnectControlState::Connecting => "Connecting...",
            ConnectControlState::FetchingData => "Fetching data...",
            ConnectControlState::Connected => "Connected",
        };
        info!(?state, "{label}");
    }

    fn show_profile(&self, profile: &Profile) {
        info!(
            handle = %profile.handle,
            name = %profile.display_name,
            avatar = %profile.avatar_url,
            "profile ready"
        );
    }

    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success => info!("{}", notice.message),
            Severity::Warning | Severity::Danger => warn!("{}", notice.message),
        }
    }

    fn set_export_busy(&self, action: ExportAction, busy: bool) {
        debug!(?action, busy, "export control");
    }
}
