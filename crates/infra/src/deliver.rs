//! Export delivery channels
//!
//! File download, clipboard write, and the pre-filled tweet window, each
//! behind its delivery port.

use std::path::PathBuf;

use async_trait::async_trait;
use monart_core::ports::{ClipboardDelivery, DeliveryError, FileDelivery, ShareComposer};
use monart_domain::constants::SHARE_COMPOSE_ENDPOINT;
use monart_domain::ExportConfig;
use tracing::{debug, info};

use crate::browser;

/// Writes the card image into the configured download directory
pub struct FileDownloadSink {
    directory: PathBuf,
    file_name: String,
}

impl FileDownloadSink {
    #[must_use]
    pub fn new(config: &ExportConfig) -> Self {
        Self { directory: config.download_dir.clone(), file_name: config.file_name.clone() }
    }
}

#[async_trait]
impl FileDelivery for FileDownloadSink {
    async fn save(&self, png: &[u8]) -> Result<PathBuf, DeliveryError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|err| DeliveryError::Io(err.to_string()))?;

        let path = self.directory.join(&self.file_name);
        tokio::fs::write(&path, png)
            .await
            .map_err(|err| DeliveryError::Io(err.to_string()))?;

        info!(path = %path.display(), bytes = png.len(), "card image saved");
        Ok(path)
    }
}

/// System clipboard channel
///
/// No crate in the stack writes image data to the OS clipboard, so this
/// channel reports itself unsupported and the exporter takes its download
/// fallback.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClipboardDelivery for SystemClipboard {
    async fn copy_image(&self, _png: &[u8]) -> Result<(), DeliveryError> {
        debug!("clipboard image delivery unavailable");
        Err(DeliveryError::Unsupported)
    }
}

/// Opens the social compose window pre-filled with the share text
pub struct IntentComposer {
    endpoint: String,
}

impl IntentComposer {
    #[must_use]
    pub fn new() -> Self {
        Self { endpoint: SHARE_COMPOSE_ENDPOINT.to_string() }
    }

    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }

    /// Compose-window URL for `text`
    #[must_use]
    pub fn compose_url(&self, text: &str) -> String {
        format!("{}?text={}", self.endpoint, urlencoding::encode(text))
    }
}

impl Default for IntentComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShareComposer for IntentComposer {
    async fn open_compose(&self, text: &str) -> Result<(), DeliveryError> {
        let url = self.compose_url(text);
        debug!(%url, "opening compose window");
        browser::open(&url).map_err(|err| DeliveryError::Launch(err.to_string()))
    }
}
