//! The update pipeline: fetch, gate, download, persist, apply.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::{DownloadError, UpdateError};
use crate::fetch::fetch_latest;
use crate::gate::{self, Freshness};
use crate::http::HttpClient;
use crate::marker::MarkerStore;
use crate::types::{FreshnessMarker, ImageRecord};
use crate::wallpaper::WallpaperBackend;
use crate::{image, metadata};

/// What a single pipeline run did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Another run was already in flight; this one did nothing.
    AlreadyRunning,
    /// The current picture is already applied.
    Skipped,
    /// A new picture was stored and applied.
    Applied { path: PathBuf, record: ImageRecord },
}

/// Fetches the latest picture and applies it when it is new.
pub struct UpdatePipeline<C, W> {
    client: C,
    backend: W,
    store: MarkerStore,
    config: Config,
    running: AtomicBool,
}

impl<C: HttpClient, W: WallpaperBackend> UpdatePipeline<C, W> {
    pub fn new(client: C, backend: W, config: Config) -> Self {
        let store = MarkerStore::new(config.download_dir.clone());
        Self {
            client,
            backend,
            store,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Run the pipeline once. Overlapping calls from other tasks return
    /// `AlreadyRunning` instead of queuing. `force` skips the freshness
    /// gate and reapplies whatever the page currently shows.
    pub async fn run(&self, force: bool) -> Result<RunOutcome, UpdateError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            info!("update already in progress, skipping");
            return Ok(RunOutcome::AlreadyRunning);
        }
        let result = self.run_inner(force).await;
        self.running.store(false, Ordering::Release);
        result
    }

    async fn run_inner(&self, force: bool) -> Result<RunOutcome, UpdateError> {
        let record = fetch_latest(&self.client, &self.config)
            .instrument(info_span!("fetch"))
            .await?;
        info!(url = %record.url, title = ?record.title, "latest picture");

        if !force {
            let marker = self.store.load();
            let current = self.backend.current();
            match gate::assess(
                &record,
                marker.as_ref(),
                current.as_deref(),
                &self.config.download_dir,
            ) {
                Freshness::Fresh => {
                    info!("picture unchanged, nothing to do");
                    return Ok(RunOutcome::Skipped);
                }
                Freshness::Stale(reason) => {
                    info!(reason = reason.as_str(), "picture is stale");
                }
            }
        }

        let bytes = self
            .client
            .fetch_bytes(&record.url)
            .instrument(info_span!("download"))
            .await
            .map_err(DownloadError::from)?;
        let (width, height) = image::validate_dimensions(&bytes)?;
        info!(width, height, bytes = bytes.len(), "downloaded image");

        let path = image::persist_asset(&bytes, &record.filename(), &self.config.download_dir)
            .map_err(DownloadError::from)?;

        // Metadata is best-effort; a picture we cannot annotate is
        // still a picture we can apply.
        if let Err(e) = metadata::embed_metadata(&path, &record) {
            warn!(error = %e, path = %path.display(), "could not embed metadata");
        }
        if let Err(e) = metadata::write_sidecar(&self.config.download_dir, &record) {
            warn!(error = %e, "could not write sidecar");
        }

        if self.config.set_wallpaper {
            self.backend.set(&path)?;
            info!(path = %path.display(), "wallpaper applied");
        } else {
            info!("wallpaper application disabled by config");
        }

        self.store.save(&FreshnessMarker {
            last_image_url: record.url.clone(),
            last_update: record.publish_date,
        })?;

        Ok(RunOutcome::Applied { path, record })
    }
}

/// Flat run summary for machine consumers.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn from_result(result: &Result<RunOutcome, UpdateError>) -> Self {
        match result {
            Ok(RunOutcome::AlreadyRunning) => Self {
                success: true,
                state: "already_running",
                path: None,
                error: None,
            },
            Ok(RunOutcome::Skipped) => Self {
                success: true,
                state: "skipped",
                path: None,
                error: None,
            },
            Ok(RunOutcome::Applied { path, .. }) => Self {
                success: true,
                state: "marker_updated",
                path: Some(path.clone()),
                error: None,
            },
            Err(e) => Self {
                success: false,
                state: e.terminal_state(),
                path: None,
                error: Some(e.to_string()),
            },
        }
    }
}
