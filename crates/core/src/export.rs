//! Card export service
//!
//! Share, copy, and download each capture the visible card through the
//! capture port and deliver the raster through their own channel. Every
//! failure is absorbed into a notification plus a degraded outcome; none
//! of the operations surfaces an error to the caller.

use std::path::PathBuf;
use std::sync::Arc;

use monart_domain::{ExportConfig, Notice, Profile};
use tracing::{debug, warn};

use crate::ports::{
    CardCapture, ClipboardDelivery, ConnectUi, ExportAction, FileDelivery, ShareComposer,
};

/// Channel an export was actually delivered through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Share: card saved to disk and the compose window opened
    SharedWithFile(PathBuf),
    /// Copy: card placed on the system clipboard
    Clipboard,
    /// Copy fallback: clipboard unavailable, card saved to disk instead
    DownloadFallback(PathBuf),
    /// Download: card saved to disk
    Downloaded(PathBuf),
}

/// Terminal result of one export operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Delivered(Delivery),
    /// Share only: capture failed, a text-only compose window was opened
    TextOnly,
    /// Capture or delivery failed; the user has been notified
    Failed,
}

/// Drives the share / copy / download export actions
pub struct CardExporter {
    config: ExportConfig,
    ui: Arc<dyn ConnectUi>,
    capture: Arc<dyn CardCapture>,
    files: Arc<dyn FileDelivery>,
    clipboard: Arc<dyn ClipboardDelivery>,
    composer: Arc<dyn ShareComposer>,
}

impl CardExporter {
    #[must_use]
    pub fn new(
        config: ExportConfig,
        ui: Arc<dyn ConnectUi>,
        capture: Arc<dyn CardCapture>,
        files: Arc<dyn FileDelivery>,
        clipboard: Arc<dyn ClipboardDelivery>,
        composer: Arc<dyn ShareComposer>,
    ) -> Self {
        Self { config, ui, capture, files, clipboard, composer }
    }

    /// Share the card: save the image, then open a pre-filled compose
    /// window
    ///
    /// The raster cannot be attached programmatically, so the image is
    /// downloaded first and the user attaches it by hand. Capture failure
    /// degrades to a text-only compose window.
    pub async fn share(&self, profile: &Profile) -> ExportOutcome {
        self.ui.set_export_busy(ExportAction::Share, true);
        let outcome = self.share_inner(profile).await;
        self.ui.set_export_busy(ExportAction::Share, false);
        outcome
    }

    async fn share_inner(&self, profile: &Profile) -> ExportOutcome {
        let png = match self.capture.capture(profile).await {
            Ok(card) => card.png,
            Err(err) => {
                warn!(error = %err, "card capture failed; sharing text only");
                self.open_compose(&self.config.share_text).await;
                return ExportOutcome::TextOnly;
            }
        };

        let saved = match self.files.save(&png).await {
            Ok(path) => {
                self.ui.notify(Notice::success(
                    "Card image downloaded! Add it to your tweet manually.",
                ));
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "failed to save card image; sharing text only");
                None
            }
        };

        // The compose text mentions the downloaded image only when it exists
        match saved {
            Some(path) => {
                self.open_compose(&self.config.share_text_with_image).await;
                ExportOutcome::Delivered(Delivery::SharedWithFile(path))
            }
            None => {
                self.open_compose(&self.config.share_text).await;
                ExportOutcome::TextOnly
            }
        }
    }

    /// Copy the card image to the system clipboard
    ///
    /// A clipboard that fails or does not exist falls back to a plain file
    /// download.
    pub async fn copy(&self, profile: &Profile) -> ExportOutcome {
        self.ui.set_export_busy(ExportAction::Copy, true);
        let outcome = self.copy_inner(profile).await;
        self.ui.set_export_busy(ExportAction::Copy, false);
        outcome
    }

    async fn copy_inner(&self, profile: &Profile) -> ExportOutcome {
        let png = match self.capture.capture(profile).await {
            Ok(card) => card.png,
            Err(err) => return self.capture_failed(&err),
        };

        match self.clipboard.copy_image(&png).await {
            Ok(()) => {
                self.ui.notify(Notice::success(
                    "Card image copied to clipboard! You can now paste it anywhere.",
                ));
                ExportOutcome::Delivered(Delivery::Clipboard)
            }
            Err(err) => {
                debug!(error = %err, "clipboard delivery failed; falling back to download");
                match self.files.save(&png).await {
                    Ok(path) => {
                        self.ui.notify(Notice::warning(
                            "Image copied to clipboard failed. Image downloaded instead.",
                        ));
                        ExportOutcome::Delivered(Delivery::DownloadFallback(path))
                    }
                    Err(err) => {
                        warn!(error = %err, "download fallback failed");
                        self.ui.notify(Notice::danger("Failed to export card image."));
                        ExportOutcome::Failed
                    }
                }
            }
        }
    }

    /// Download the card image to disk
    pub async fn download(&self, profile: &Profile) -> ExportOutcome {
        self.ui.set_export_busy(ExportAction::Download, true);
        let outcome = self.download_inner(profile).await;
        self.ui.set_export_busy(ExportAction::Download, false);
        outcome
    }

    async fn download_inner(&self, profile: &Profile) -> ExportOutcome {
        let png = match self.capture.capture(profile).await {
            Ok(card) => card.png,
            Err(err) => return self.capture_failed(&err),
        };

        match self.files.save(&png).await {
            Ok(path) => {
                self.ui.notify(Notice::success("Card image downloaded successfully!"));
                ExportOutcome::Delivered(Delivery::Downloaded(path))
            }
            Err(err) => {
                warn!(error = %err, "failed to save card image");
                self.ui.notify(Notice::danger("Failed to export card image."));
                ExportOutcome::Failed
            }
        }
    }

    async fn open_compose(&self, text: &str) {
        if let Err(err) = self.composer.open_compose(text).await {
            warn!(error = %err, "failed to open compose window");
            self.ui.notify(Notice::danger("Failed to open the share window."));
        }
    }

    fn capture_failed(&self, err: &dyn std::error::Error) -> ExportOutcome {
        warn!(error = %err, "card capture failed");
        self.ui.notify(Notice::danger("Failed to capture card image."));
        ExportOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for export.
    use monart_domain::constants::{SHARE_TEXT, SHARE_TEXT_WITH_IMAGE};
    use monart_domain::Severity;
    use tokio_test::block_on;

    use super::*;
    use crate::testing::{RecordingUi, StubCapture, StubClipboard, StubComposer, StubFileDelivery};

    struct Harness {
        ui: Arc<RecordingUi>,
        files: Arc<StubFileDelivery>,
        clipboard: Arc<StubClipboard>,
        composer: Arc<StubComposer>,
    }

    fn exporter(capture: StubCapture, clipboard: StubClipboard) -> (CardExporter, Harness) {
        let ui = Arc::new(RecordingUi::new());
        let files = Arc::new(StubFileDelivery::new());
        let clipboard = Arc::new(clipboard);
        let composer = Arc::new(StubComposer::new());

        let exporter = CardExporter::new(
            ExportConfig::default(),
            ui.clone(),
            Arc::new(capture),
            files.clone(),
            clipboard.clone(),
            composer.clone(),
        );

        (exporter, Harness { ui, files, clipboard, composer })
    }

    fn png() -> Vec<u8> {
        vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3]
    }

    /// Validates the share happy path.
    ///
    /// Assertions:
    /// - Ensures the image is saved before the compose window opens.
    /// - Confirms the compose text and the manual-attach notification.
    /// - Ensures the button busy state is set and restored.
    #[tokio::test]
    async fn test_share_saves_image_and_opens_compose() {
        let (exporter, h) = exporter(StubCapture::succeeding(png()), StubClipboard::new());

        let outcome = exporter.share(&Profile::placeholder()).await;

        assert!(matches!(outcome, ExportOutcome::Delivered(Delivery::SharedWithFile(_))));
        assert_eq!(h.files.saved_sizes(), vec![png().len()]);
        assert_eq!(h.composer.compose_texts(), vec![SHARE_TEXT_WITH_IMAGE.to_string()]);
        assert!(h
            .ui
            .notices()
            .iter()
            .any(|n| n.severity == Severity::Success && n.message.contains("manually")));
        assert_eq!(
            h.ui.export_busy_log(),
            vec![(ExportAction::Share, true), (ExportAction::Share, false)]
        );
    }

    /// Validates the share capture-failure degradation.
    ///
    /// Assertions:
    /// - Ensures a text-only compose window still opens.
    /// - Ensures no file is saved and the busy state is restored.
    #[tokio::test]
    async fn test_share_degrades_to_text_only() {
        let (exporter, h) = exporter(StubCapture::failing(), StubClipboard::new());

        let outcome = exporter.share(&Profile::placeholder()).await;

        assert_eq!(outcome, ExportOutcome::TextOnly);
        assert_eq!(h.composer.compose_texts(), vec![SHARE_TEXT.to_string()]);
        assert!(h.files.saved_sizes().is_empty());
        assert_eq!(
            h.ui.export_busy_log(),
            vec![(ExportAction::Share, true), (ExportAction::Share, false)]
        );
    }

    /// Validates the compose text variants of the share action.
    ///
    /// Assertions:
    /// - Ensures the manual-attach suffix appears only when the image was
    ///   actually saved.
    #[test]
    fn test_share_compose_text_marks_attached_image() {
        let (with_image, h) = exporter(StubCapture::succeeding(png()), StubClipboard::new());
        block_on(with_image.share(&Profile::placeholder()));
        assert!(h.composer.compose_texts()[0].contains("add it to your tweet"));

        let (without_image, h) = exporter(StubCapture::failing(), StubClipboard::new());
        block_on(without_image.share(&Profile::placeholder()));
        assert!(!h.composer.compose_texts()[0].contains("add it to your tweet"));
    }

    /// Validates the copy happy path.
    ///
    /// Assertions:
    /// - Ensures the image lands on the clipboard with a success
    ///   notification and no file download.
    #[tokio::test]
    async fn test_copy_places_image_on_clipboard() {
        let (exporter, h) = exporter(StubCapture::succeeding(png()), StubClipboard::new());

        let outcome = exporter.copy(&Profile::placeholder()).await;

        assert_eq!(outcome, ExportOutcome::Delivered(Delivery::Clipboard));
        assert_eq!(h.clipboard.copied_sizes(), vec![png().len()]);
        assert!(h.files.saved_sizes().is_empty());
        assert!(h
            .ui
            .notices()
            .iter()
            .any(|n| n.severity == Severity::Success && n.message.contains("clipboard")));
    }

    /// Validates the copy clipboard-unavailable fallback.
    ///
    /// Assertions:
    /// - Ensures the image is downloaded instead with a warning
    ///   notification.
    #[tokio::test]
    async fn test_copy_falls_back_to_download() {
        let (exporter, h) = exporter(StubCapture::succeeding(png()), StubClipboard::unsupported());

        let outcome = exporter.copy(&Profile::placeholder()).await;

        assert!(matches!(outcome, ExportOutcome::Delivered(Delivery::DownloadFallback(_))));
        assert_eq!(h.files.saved_sizes(), vec![png().len()]);
        assert!(h
            .ui
            .notices()
            .iter()
            .any(|n| n.severity == Severity::Warning && n.message.contains("downloaded instead")));
    }

    /// Validates the copy capture-failure path.
    ///
    /// Assertions:
    /// - Ensures the outcome is `Failed` with a danger notification and a
    ///   restored button.
    #[tokio::test]
    async fn test_copy_capture_failure_notifies() {
        let (exporter, h) = exporter(StubCapture::failing(), StubClipboard::new());

        let outcome = exporter.copy(&Profile::placeholder()).await;

        assert_eq!(outcome, ExportOutcome::Failed);
        assert!(h.clipboard.copied_sizes().is_empty());
        assert!(h
            .ui
            .notices()
            .iter()
            .any(|n| n.severity == Severity::Danger && n.message.contains("capture")));
        assert_eq!(
            h.ui.export_busy_log(),
            vec![(ExportAction::Copy, true), (ExportAction::Copy, false)]
        );
    }

    /// Validates the download happy path.
    ///
    /// Assertions:
    /// - Ensures the image is saved with a success notification.
    #[tokio::test]
    async fn test_download_saves_image() {
        let (exporter, h) = exporter(StubCapture::succeeding(png()), StubClipboard::new());

        let outcome = exporter.download(&Profile::placeholder()).await;

        assert!(matches!(outcome, ExportOutcome::Delivered(Delivery::Downloaded(_))));
        assert_eq!(h.files.saved_sizes(), vec![png().len()]);
        assert!(h
            .ui
            .notices()
            .iter()
            .any(|n| n.severity == Severity::Success && n.message.contains("downloaded")));
    }

    /// Validates the download save-failure path.
    ///
    /// Assertions:
    /// - Ensures a failed save yields `Failed` with a danger notification.
    #[tokio::test]
    async fn test_download_save_failure_notifies() {
        let ui = Arc::new(RecordingUi::new());
        let files = Arc::new(StubFileDelivery::failing());
        let exporter = CardExporter::new(
            ExportConfig::default(),
            ui.clone(),
            Arc::new(StubCapture::succeeding(png())),
            files,
            Arc::new(StubClipboard::new()),
            Arc::new(StubComposer::new()),
        );

        let outcome = exporter.download(&Profile::placeholder()).await;

        assert_eq!(outcome, ExportOutcome::Failed);
        assert!(ui.notices().iter().any(|n| n.severity == Severity::Danger));
        assert_eq!(
            ui.export_busy_log(),
            vec![(ExportAction::Download, true), (ExportAction::Download, false)]
        );
    }
}
