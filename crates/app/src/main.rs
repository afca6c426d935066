//! MonArt Cards - connect and export runner
//!
//! Wires the infrastructure adapters into the core flow: connects the
//! user's Twitter account through the loopback OAuth surface, renders the
//! profile, and exports the card through the requested channel.

use std::sync::Arc;

use anyhow::{bail, Context};
use monart_core::{CardExporter, ConnectFlow, ConnectOutcome, ExportOutcome};
use monart_infra::{
    config, BackendClient, CardCompositor, FileDownloadSink, FileSessionStore, HttpClient,
    IntentComposer, LoopbackSurface, SystemClipboard,
};
use tracing::{info, warn};

mod ui;

use ui::TerminalUi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportMode {
    Download,
    Share,
    Copy,
}

fn parse_mode(args: &[String]) -> anyhow::Result<ExportMode> {
    match args.first().map(String::as_str) {
        None | Some("download") => Ok(ExportMode::Download),
        Some("share") => Ok(ExportMode::Share),
        Some("copy") => Ok(ExportMode::Copy),
        Some(other) => bail!("unknown export mode '{other}' (expected share, copy, or download)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => warn!(error = %err, "no .env file loaded"),
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_mode(&args)?;

    let config = config::load().context("failed to load configuration")?;
    info!(backend = %config.connect.backend_url, "MonArt Cards starting");

    let http = HttpClient::new().context("failed to build http client")?;
    let store = Arc::new(FileSessionStore::open(&config.session_file));
    let ui = Arc::new(TerminalUi::new());
    let surface = Arc::new(LoopbackSurface::new(config.connect.redirect_uri.clone()));
    let backend = Arc::new(BackendClient::new(http.clone(), config.connect.backend_url.clone()));

    let flow = ConnectFlow::new(
        config.connect.clone(),
        store.clone(),
        ui.clone(),
        surface,
        backend,
    );

    let profile = match flow.connect().await {
        ConnectOutcome::Connected(profile) => profile,
        ConnectOutcome::Cancelled => {
            info!("authorization was cancelled; nothing to export");
            return Ok(());
        }
        ConnectOutcome::Aborted(kind) => {
            bail!("connect attempt failed: {kind:?}");
        }
        ConnectOutcome::AlreadyRunning => {
            bail!("another connect attempt is already in flight");
        }
    };

    let exporter = CardExporter::new(
        config.export.clone(),
        ui,
        Arc::new(CardCompositor::new(http)),
        Arc::new(FileDownloadSink::new(&config.export)),
        Arc::new(SystemClipboard::new()),
        Arc::new(IntentComposer::new()),
    );

    let outcome = match mode {
        ExportMode::Download => exporter.download(&profile).await,
        ExportMode::Share => exporter.share(&profile).await,
        ExportMode::Copy => exporter.copy(&profile).await,
    };

    match outcome {
        ExportOutcome::Delivered(delivery) => info!(?delivery, "card exported"),
        ExportOutcome::TextOnly => info!("card exported as text-only share"),
        ExportOutcome::Failed => warn!("card export failed"),
    }

    Ok(())
}
