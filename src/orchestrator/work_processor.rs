//! Single work processor - orchestration layer
//!
//! ## Responsibilities
//!
//! 1. **Volume iteration**: process a work's volumes in ascending
//!    imagegroup order, delegating each to the volume flow
//! 2. **Resume rule**: when this work matches the checkpoint's in-progress
//!    pointer, volumes ordering before the checkpointed imagegroup are
//!    skipped (normalized comparison, not raw lexical order)
//! 3. **Failure checkpointing**: a failed volume is recorded before the
//!    error propagates; the batch driver decides what happens next
//! 4. **Publish and cleanup**: after all volumes, hand the work's OCR
//!    output directory to the publish step, purge local artifacts, record
//!    the work as completed

use crate::checkpoint::CheckpointManager;
use crate::clients::{ArtifactStore, MetadataClient, OcrClient};
use crate::error::PipelineResult;
use crate::models::{group_precedes, sort_volumes, WorkId};
use crate::services::{Notifier, Publisher, StagingArea};
use crate::workflow::{VolumeCtx, VolumeFlow};
use std::sync::Arc;
use tracing::{error, info, warn};

/// How a work ended
#[derive(Debug, PartialEq, Eq)]
pub enum WorkOutcome {
    /// At least one volume was processed and the work was published
    Processed { volumes: usize },
    /// The work had no volumes to process; no publish step ran
    Empty,
}

/// Processes one work end to end
pub struct WorkProcessor {
    metadata: Arc<dyn MetadataClient>,
    archive_store: Arc<dyn ArtifactStore>,
    ocr_store: Arc<dyn ArtifactStore>,
    ocr: Arc<dyn OcrClient>,
    staging: StagingArea,
    publisher: Arc<dyn Publisher>,
    notifier: Arc<dyn Notifier>,
    ocr_concurrency: usize,
}

impl WorkProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        metadata: Arc<dyn MetadataClient>,
        archive_store: Arc<dyn ArtifactStore>,
        ocr_store: Arc<dyn ArtifactStore>,
        ocr: Arc<dyn OcrClient>,
        staging: StagingArea,
        publisher: Arc<dyn Publisher>,
        notifier: Arc<dyn Notifier>,
        ocr_concurrency: usize,
    ) -> Self {
        Self {
            metadata,
            archive_store,
            ocr_store,
            ocr,
            staging,
            publisher,
            notifier,
            ocr_concurrency,
        }
    }

    pub async fn process(
        &self,
        work: &WorkId,
        work_index: usize,
        checkpoint: &mut CheckpointManager,
    ) -> PipelineResult<WorkOutcome> {
        self.notifier
            .notify(&format!("work {} processing ...", work.local))
            .await;

        let mut volumes = self.metadata.list_volumes(work).await?;
        sort_volumes(&mut volumes);

        log_work_start(work_index, work, volumes.len());

        let resume_point = checkpoint.resume_point(&work.local).map(str::to_string);

        let flow = VolumeFlow::new(
            self.metadata.clone(),
            self.archive_store.clone(),
            self.ocr_store.clone(),
            self.ocr.clone(),
            self.staging.clone(),
            self.ocr_concurrency,
        );

        let total = volumes.len();
        let mut processed = 0;

        for (index, volume) in volumes.iter().enumerate() {
            if let Some(resume) = &resume_point {
                if group_precedes(&volume.imagegroup, resume) {
                    info!(
                        "[work {}] volume {} precedes checkpoint {}, skipping",
                        work_index, volume.imagegroup, resume
                    );
                    continue;
                }
            }

            self.notifier
                .notify(&format!("volume {} processing ...", volume.imagegroup))
                .await;

            let ctx = VolumeCtx::new(
                &work.local,
                &volume.imagegroup,
                work_index,
                index + 1,
                total,
            );

            if let Err(e) = flow.run(volume, &ctx).await {
                // partial progress is durable; record where to resume
                record_volume_checkpoint(checkpoint, &work.local, &volume.imagegroup);
                return Err(e);
            }
            processed += 1;
        }

        if processed == 0 {
            warn!("[work {}] empty work: {}", work_index, work.local);
            return Ok(WorkOutcome::Empty);
        }

        // publish, then release local artifacts, then mark the work done;
        // already-archived volumes stay archived whatever happens here
        let ocr_dir = self.staging.ocr_work_dir(&work.local);
        if let Err(e) = self.publisher.publish(&work.local, &ocr_dir).await {
            if let Some(last) = volumes.last() {
                record_volume_checkpoint(checkpoint, &work.local, &last.imagegroup);
            }
            return Err(e.into());
        }

        self.staging.purge_work(&work.local)?;
        checkpoint.record_work_done(&work.local)?;

        log_work_complete(work_index, work, processed);
        Ok(WorkOutcome::Processed { volumes: processed })
    }
}

/// Best effort: the original failure matters more than a checkpoint write
/// failure, which is only logged.
fn record_volume_checkpoint(checkpoint: &mut CheckpointManager, work: &str, imagegroup: &str) {
    if let Err(e) = checkpoint.record_volume(work, imagegroup) {
        error!("checkpoint write failed for {}-{}: {}", work, imagegroup, e);
    }
}

// ========== log helpers ==========

fn log_work_start(work_index: usize, work: &WorkId, volume_count: usize) {
    info!("[work {}] start: {}", work_index, work.local);
    info!("[work {}] volumes: {}", work_index, volume_count);
}

fn log_work_complete(work_index: usize, work: &WorkId, processed: usize) {
    info!(
        "[work {}] ✅ {} complete: {} volumes archived and published",
        work_index, work.local, processed
    );
}
