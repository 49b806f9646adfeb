//! attache - queue local files and upload them to an in-memory asset store.
//!
//! ```text
//! attache upload --parent T1 a.png b.pdf
//! attache upload --deferred --target T1 --fail a.png="quota exceeded" a.png b.png
//! ```

mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use attache_core::app::Rejection;
use attache_core::domain::{PendingSnapshot, StoreError};
use attache_core::impls::{InMemoryAssetStore, StoreCall};
use attache_core::{AssetManager, CommittedAsset, QueueCounts, SelectedFile};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Parser)]
#[command(name = "attache", version, about = "Upload queue for file attachments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Queue files and upload them, immediately or in one deferred batch
    Upload(UploadArgs),
}

#[derive(Debug, Args)]
struct UploadArgs {
    /// Existing parent: every accepted file uploads right away
    #[arg(long, conflicts_with = "deferred")]
    parent: Option<String>,

    /// Queue everything first, then flush once to --target
    #[arg(long, requires = "target")]
    deferred: bool,

    /// Parent created after the files were queued (deferred mode)
    #[arg(long)]
    target: Option<String>,

    /// Make the store reject one upload: FILENAME=MESSAGE (repeatable)
    #[arg(long = "fail", value_name = "FILENAME=MESSAGE", value_parser = parse_failure)]
    failures: Vec<(String, String)>,

    /// Settings file used instead of ./attache.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn parse_failure(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((filename, message)) if !filename.is_empty() => Ok((filename.to_string(), message.to_string())),
        _ => Err(format!("expected FILENAME=MESSAGE, got {raw:?}")),
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    mode: &'static str,
    parent: String,
    accepted: usize,
    rejected: Vec<Rejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all_ok: Option<bool>,
    committed: Vec<CommittedAsset>,
    pending: Vec<PendingSnapshot>,
    counts: QueueCounts,
    store_calls: Vec<StoreCall>,
}

impl Summary {
    fn succeeded(&self) -> bool {
        self.rejected.is_empty() && self.counts.error == 0 && self.all_ok.unwrap_or(true)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Upload(args) => {
            let summary = upload(args).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(if summary.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn upload(args: UploadArgs) -> anyhow::Result<Summary> {
    let config = settings::load(args.config.as_deref()).context("failed to load settings")?;
    tracing::debug!(?config, "loaded settings");

    let store = Arc::new(InMemoryAssetStore::new());
    for (filename, message) in &args.failures {
        store.fail_next_add(filename.clone(), StoreError::rejected(message.clone())).await;
    }

    let (mode, parent) = match (&args.parent, args.deferred, &args.target) {
        (Some(parent), false, _) => ("immediate", parent.clone()),
        (None, true, Some(target)) => ("deferred", target.clone()),
        _ => bail!("pass either --parent <ID> or --deferred --target <ID>"),
    };

    let mut builder = AssetManager::builder().store(store.clone()).config(config);
    if mode == "immediate" {
        builder = builder.parent(parent.clone());
    }
    let manager = builder.build()?;

    let mut events = manager.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::debug!(event = event.kind.name(), counts = ?event.counts, "asset event"),
                Err(RecvError::Lagged(skipped)) => tracing::debug!(skipped, "event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(read_file(path).await?);
    }
    let report = manager.add_files(files).await;
    for rejection in &report.rejected {
        tracing::warn!(filename = %rejection.filename, error = %rejection.message, "file rejected");
    }

    let all_ok = if mode == "deferred" {
        Some(manager.upload_all_pending(parent.clone()).await)
    } else {
        manager.settled().await;
        None
    };

    let summary = Summary {
        mode,
        parent,
        accepted: report.accepted.len(),
        rejected: report.rejected,
        all_ok,
        committed: manager.committed().await,
        pending: manager.pending().await,
        counts: manager.counts().await,
        store_calls: store.calls().await,
    };

    manager.shutdown().await;
    if let Err(err) = event_log.await {
        tracing::warn!(error = %err, "event log task failed");
    }
    Ok(summary)
}

/// Read a file from disk, sniffing its mime type from the content.
async fn read_file(path: &Path) -> anyhow::Result<SelectedFile> {
    let payload = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("not a file path: {}", path.display()))?;
    let mime_type = infer::get(&payload)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_MIME_TYPE)
        .to_string();
    tracing::debug!(filename = %name, mime_type = %mime_type, size = payload.len(), "read file");
    Ok(SelectedFile::new(name, mime_type, payload))
}
