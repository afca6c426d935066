//! System browser launching

use monart_domain::{MonartError, Result};
use tracing::debug;

/// Open `url` in the user's default browser.
///
/// The launcher process is spawned and not awaited; the caller observes
/// progress through other channels (the loopback callback, or not at
/// all for the compose window).
///
/// # Errors
/// Returns `MonartError::Io` if the launcher process cannot be spawned.
pub fn open(url: &str) -> Result<()> {
    debug!(%url, "opening system browser");

    let result = launcher_command(url).spawn();

    result
        .map(|_| ())
        .map_err(|err| MonartError::Io(format!("failed to launch browser: {err}")))
}

#[cfg(target_os = "macos")]
fn launcher_command(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn launcher_command(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("cmd");
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn launcher_command(url: &str) -> std::process::Command {
    let mut command = std::process::Command::new("xdg-open");
    command.arg(url);
    command
}
