//! Volume processing flow - workflow layer
//!
//! Brings one volume to "archived" state with minimal redundant work.
//! Steps, in order, each independently skippable when its output already
//! exists:
//!
//! 1. **Fetch**: download source images that are neither staged nor already
//!    archived, normalize the format, stage locally
//! 2. **OCR**: recognize staged pages lacking an OCR object, through a
//!    bounded worker pool with a barrier at volume end
//! 3. **Archive**: upload the batch manifest, then every staged image and
//!    OCR output not already present at its deterministic key
//! 4. **Purge**: drop this volume's staged images, only after step 3
//!
//! Failures are recovered only at single-image granularity (missing source
//! object, undecodable bytes, OCR service error). Anything above that
//! propagates after the partial progress of earlier steps is already
//! durable.

use crate::clients::{ArtifactStore, MetadataClient, OcrClient, OcrOutcome};
use crate::error::{PipelineError, PipelineResult, StagingError, StorageError};
use crate::models::VolumeInfo;
use crate::paths::{self, IMAGES};
use crate::services::StagingArea;
use crate::workflow::VolumeCtx;
use chrono::Utc;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Per-volume processing counters
#[derive(Debug, Default)]
pub struct VolumeStats {
    /// Images downloaded and staged this run
    pub fetched: usize,
    /// Pages recognized this run (blank pages included)
    pub recognized: usize,
    /// Pages whose OCR call failed and was skipped
    pub ocr_failed: usize,
    /// Objects uploaded this run (images + OCR outputs)
    pub uploaded: usize,
    /// Pages skipped because their output already existed
    pub skipped: usize,
}

/// One volume's fetch → OCR → archive → purge flow
///
/// Holds only injected collaborators; created once per work and reused
/// across its volumes.
pub struct VolumeFlow {
    metadata: Arc<dyn MetadataClient>,
    archive_store: Arc<dyn ArtifactStore>,
    ocr_store: Arc<dyn ArtifactStore>,
    ocr: Arc<dyn OcrClient>,
    staging: StagingArea,
    ocr_concurrency: usize,
}

impl VolumeFlow {
    pub fn new(
        metadata: Arc<dyn MetadataClient>,
        archive_store: Arc<dyn ArtifactStore>,
        ocr_store: Arc<dyn ArtifactStore>,
        ocr: Arc<dyn OcrClient>,
        staging: StagingArea,
        ocr_concurrency: usize,
    ) -> Self {
        Self {
            metadata,
            archive_store,
            ocr_store,
            ocr,
            staging,
            ocr_concurrency: ocr_concurrency.max(1),
        }
    }

    pub async fn run(&self, volume: &VolumeInfo, ctx: &VolumeCtx) -> PipelineResult<VolumeStats> {
        log_volume_start(ctx);

        let mut stats = VolumeStats::default();
        let service = paths::service_paths(&ctx.work_local_id, &ctx.imagegroup);

        self.fetch_images(volume, ctx, &service, &mut stats).await?;
        self.recognize_pages(ctx, &service, &mut stats).await?;
        self.archive(ctx, &service, &mut stats).await?;

        // staged images are only dropped once every upload went through
        self.staging
            .purge_volume(&ctx.work_local_id, &ctx.imagegroup)?;

        log_volume_complete(ctx, &stats);
        Ok(stats)
    }

    /// Step 1: download and stage every image that still needs processing.
    async fn fetch_images(
        &self,
        volume: &VolumeInfo,
        ctx: &VolumeCtx,
        service: &paths::ServicePaths,
        stats: &mut VolumeStats,
    ) -> PipelineResult<()> {
        let images = self.metadata.list_images(volume).await?;
        let source_prefix = paths::source_image_prefix(&ctx.work_local_id, &ctx.imagegroup);

        info!(
            "[work {}] volume {}: {} images listed",
            ctx.work_index,
            ctx.imagegroup,
            images.len()
        );

        for image in &images {
            if self
                .staging
                .image_exists(&ctx.work_local_id, &ctx.imagegroup, &image.filename)
            {
                continue;
            }

            // a previous run may have archived this page already
            let output_key = format!(
                "{}/{}",
                service.output,
                StagingArea::ocr_output_name(&image.filename)
            );
            if self.ocr_store.exists(&output_key).await? {
                stats.skipped += 1;
                continue;
            }

            let source_key = format!("{}/{}", source_prefix, image.filename);
            let bytes = match self.archive_store.get(&source_key).await {
                Ok(bytes) => bytes,
                Err(StorageError::NotFound { key }) => {
                    warn!("[work {}] source object missing, skipping: {}", ctx.work_index, key);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match self.staging.stage_image(
                &ctx.work_local_id,
                &ctx.imagegroup,
                &image.filename,
                &bytes,
            ) {
                Ok(()) => stats.fetched += 1,
                Err(StagingError::Decode { path, detail }) => {
                    error!(
                        "[work {}] undecodable image, skipping {}: {}",
                        ctx.work_index, path, detail
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Step 2: OCR every staged page lacking an output object. Requests run
    /// through a bounded pool; the volume waits for all of them before
    /// moving on. A single bad page never aborts the volume.
    async fn recognize_pages(
        &self,
        ctx: &VolumeCtx,
        service: &paths::ServicePaths,
        stats: &mut VolumeStats,
    ) -> PipelineResult<()> {
        let staged = self
            .staging
            .list_staged_images(&ctx.work_local_id, &ctx.imagegroup)?;

        let semaphore = Arc::new(Semaphore::new(self.ocr_concurrency));
        let mut handles = Vec::new();

        for (name, path) in staged {
            if self
                .staging
                .ocr_exists(&ctx.work_local_id, &ctx.imagegroup, &name)
            {
                continue;
            }
            let output_key = format!("{}/{}", service.output, StagingArea::ocr_output_name(&name));
            if self.ocr_store.exists(&output_key).await? {
                stats.skipped += 1;
                continue;
            }

            let bytes = self.staging.read_file(&path)?;
            let ocr = self.ocr.clone();
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Other(format!("ocr pool closed: {}", e)))?;

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let outcome = ocr.recognize(&bytes).await;
                (name, outcome)
            }));
        }

        // barrier: results are indexed by filename, arrival order is free
        for joined in join_all(handles).await {
            let (name, outcome) = joined
                .map_err(|e| PipelineError::Other(format!("ocr task failed: {}", e)))?;

            match outcome {
                Ok(OcrOutcome::Recognized(payload)) => {
                    let json = payload.to_string();
                    self.staging
                        .write_ocr_output(&ctx.work_local_id, &ctx.imagegroup, &name, &json)?;
                    stats.recognized += 1;
                }
                Ok(OcrOutcome::Blank) => {
                    debug!("[work {}] blank page: {}", ctx.work_index, name);
                    // an empty payload keeps the image/output pairing intact
                    self.staging
                        .write_ocr_output(&ctx.work_local_id, &ctx.imagegroup, &name, "{}")?;
                    stats.recognized += 1;
                }
                Err(e) => {
                    error!(
                        "[work {}] ocr failed for {}, skipping: {}",
                        ctx.work_index, name, e
                    );
                    stats.ocr_failed += 1;
                }
            }
        }

        Ok(())
    }

    /// Step 3: upload the batch manifest, then every artifact not already
    /// present at its destination key. Existence is checked per object, so
    /// re-running after a crash repeats no upload.
    async fn archive(
        &self,
        ctx: &VolumeCtx,
        service: &paths::ServicePaths,
        stats: &mut VolumeStats,
    ) -> PipelineResult<()> {
        let info = json!({
            "timestamp": Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "imagesfolder": IMAGES,
        });
        self.ocr_store
            .put(&service.info_key(), info.to_string().into_bytes())
            .await?;

        for (name, path) in self
            .staging
            .list_staged_images(&ctx.work_local_id, &ctx.imagegroup)?
        {
            let key = format!("{}/{}", service.images, name);
            if self.ocr_store.exists(&key).await? {
                continue;
            }
            let bytes = self.staging.read_file(&path)?;
            self.ocr_store.put(&key, bytes).await?;
            stats.uploaded += 1;
        }

        for (name, path) in self
            .staging
            .list_ocr_outputs(&ctx.work_local_id, &ctx.imagegroup)?
        {
            let key = format!("{}/{}", service.output, name);
            if self.ocr_store.exists(&key).await? {
                continue;
            }
            let bytes = self.staging.read_file(&path)?;
            self.ocr_store.put(&key, bytes).await?;
            stats.uploaded += 1;
        }

        Ok(())
    }
}

// ========== log helpers ==========

fn log_volume_start(ctx: &VolumeCtx) {
    info!("[work {}] {}", ctx.work_index, "─".repeat(30));
    info!(
        "[work {}] processing volume {}/{}: {}",
        ctx.work_index, ctx.volume_index, ctx.total_volumes, ctx.imagegroup
    );
}

fn log_volume_complete(ctx: &VolumeCtx, stats: &VolumeStats) {
    info!(
        "[work {}] ✓ volume {} archived: {} fetched, {} recognized, {} uploaded, {} skipped, {} ocr failures",
        ctx.work_index,
        ctx.imagegroup,
        stats.fetched,
        stats.recognized,
        stats.uploaded,
        stats.skipped,
        stats.ocr_failed
    );
}
