//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `MONART_CLIENT_ID`: OAuth client id
//! - `MONART_REDIRECT_URI`: registered redirect target
//! - `MONART_SCOPES`: comma-separated scope list
//! - `MONART_AUTHORIZE_ENDPOINT`: provider authorization endpoint
//! - `MONART_BACKEND_URL`: trusted backend base URL
//! - `MONART_CHALLENGE_METHOD`: `plain` (default) or `s256`
//! - `MONART_POLL_INTERVAL_MS`: surface poll interval (optional)
//! - `MONART_WATCH_TIMEOUT_SECS`: surface watch deadline (optional)
//! - `MONART_DOWNLOAD_DIR`: card download directory (optional)
//! - `MONART_SHARE_TEXT`: text-only compose-window text (optional)
//! - `MONART_SHARE_TEXT_WITH_IMAGE`: compose-window text after the card
//!   image was saved (optional)
//! - `MONART_SESSION_FILE`: session store path (optional)
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `monart.{json,toml}` in the
//! working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use monart_domain::constants::{
    CARD_FILE_NAME, SHARE_TEXT, SHARE_TEXT_WITH_IMAGE, SURFACE_POLL_INTERVAL_MS,
    SURFACE_WATCH_TIMEOUT_SECS,
};
use monart_domain::{ChallengeMethod, ConnectConfig, ExportConfig, MonartError, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_SESSION_FILE: &str = "monart-session.json";

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub connect: ConnectConfig,

    #[serde(default)]
    pub export: ExportConfig,

    /// Path of the persisted session store
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_session_file() -> PathBuf {
    PathBuf::from(DEFAULT_SESSION_FILE)
}

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `MonartError::Config` if configuration cannot be loaded from
/// either source or required fields are missing.
pub fn load() -> Result<AppConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `MonartError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<AppConfig> {
    let client_id = env_var("MONART_CLIENT_ID")?;
    let redirect_uri = env_var("MONART_REDIRECT_URI")?;
    let scopes: Vec<String> = env_var("MONART_SCOPES")?
        .split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect();
    let authorize_endpoint = env_var("MONART_AUTHORIZE_ENDPOINT")?;
    let backend_url = env_var("MONART_BACKEND_URL")?;

    let challenge_method = match std::env::var("MONART_CHALLENGE_METHOD").ok() {
        None => ChallengeMethod::default(),
        Some(value) => parse_challenge_method(&value)?,
    };

    let poll_interval_ms = env_u64("MONART_POLL_INTERVAL_MS")?;
    let watch_timeout_secs = env_u64("MONART_WATCH_TIMEOUT_SECS")?;

    let connect = ConnectConfig {
        client_id,
        redirect_uri,
        scopes,
        authorize_endpoint,
        backend_url,
        challenge_method,
        poll_interval_ms: poll_interval_ms.unwrap_or(SURFACE_POLL_INTERVAL_MS),
        watch_timeout_secs: watch_timeout_secs.unwrap_or(SURFACE_WATCH_TIMEOUT_SECS),
    };

    let export = ExportConfig {
        download_dir: std::env::var("MONART_DOWNLOAD_DIR").map_or_else(|_| PathBuf::from("."), PathBuf::from),
        file_name: std::env::var("MONART_CARD_FILE_NAME")
            .unwrap_or_else(|_| CARD_FILE_NAME.to_string()),
        share_text: std::env::var("MONART_SHARE_TEXT").unwrap_or_else(|_| SHARE_TEXT.to_string()),
        share_text_with_image: std::env::var("MONART_SHARE_TEXT_WITH_IMAGE")
            .unwrap_or_else(|_| SHARE_TEXT_WITH_IMAGE.to_string()),
    };

    let session_file = std::env::var("MONART_SESSION_FILE")
        .map_or_else(|_| default_session_file(), PathBuf::from);

    let config = AppConfig { connect, export, session_file };
    config.connect.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MonartError::Config` if no file is found, the format is
/// invalid, or required fields are missing.
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MonartError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MonartError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MonartError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.connect.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MonartError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MonartError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MonartError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
#[must_use]
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("monart.json"),
            cwd.join("monart.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("monart.json"),
                exe_dir.join("monart.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn parse_challenge_method(value: &str) -> Result<ChallengeMethod> {
    match value.to_ascii_lowercase().as_str() {
        "plain" => Ok(ChallengeMethod::Plain),
        "s256" => Ok(ChallengeMethod::S256),
        other => Err(MonartError::Config(format!("Invalid challenge method: {other}"))),
    }
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| MonartError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse optional numeric environment variable
fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Err(_) => Ok(None),
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|e| MonartError::Config(format!("Invalid value for {key}: {e}"))),
    }
}
