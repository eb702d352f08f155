//! Batch driver - orchestration layer
//!
//! ## Responsibilities
//!
//! 1. **Input**: read the ordered work-id list (one id per line)
//! 2. **Checkpoint consultation**: load the checkpoint once at start and
//!    skip works already in the completed set
//! 3. **Dispatch**: hand each remaining work to the work processor, one at
//!    a time; checkpointing relies on this sequentiality
//! 4. **Failure policy**: abort the whole batch or move to the next work,
//!    per configuration
//! 5. **Final flush**: push buffered catalog updates after the list is
//!    exhausted
//! 6. **Statistics**: aggregate per-batch results

use crate::checkpoint::CheckpointManager;
use crate::config::{Config, FailurePolicy};
use crate::error::{PipelineError, PipelineResult};
use crate::models::load_work_ids;
use crate::orchestrator::work_processor::{WorkOutcome, WorkProcessor};
use crate::services::{Notifier, Publisher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Per-batch counters
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub empty: usize,
}

/// Drives one pass over the work-id list
pub struct BatchDriver {
    work_processor: WorkProcessor,
    publisher: Arc<dyn Publisher>,
    notifier: Arc<dyn Notifier>,
    input_list_path: PathBuf,
    checkpoint_path: PathBuf,
    failure_policy: FailurePolicy,
}

impl BatchDriver {
    pub fn new(
        work_processor: WorkProcessor,
        publisher: Arc<dyn Publisher>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self {
            work_processor,
            publisher,
            notifier,
            input_list_path: PathBuf::from(&config.input_list_path),
            checkpoint_path: PathBuf::from(&config.checkpoint_path),
            failure_policy: config.failure_policy,
        }
    }

    /// One batch pass. Re-running after a failure resumes from the
    /// persisted checkpoint and repeats no completed work.
    pub async fn run(&self) -> PipelineResult<BatchStats> {
        let mut checkpoint = CheckpointManager::load(&self.checkpoint_path)?;

        let works = load_work_ids(&self.input_list_path)
            .await
            .map_err(|e| PipelineError::Other(e.to_string()))?;

        self.notifier.notify("OCR batch is running ...").await;
        log_batch_start(works.len(), self.failure_policy);

        let mut stats = BatchStats {
            total: works.len(),
            ..Default::default()
        };

        for (index, work) in works.iter().enumerate() {
            let work_index = index + 1;

            if checkpoint.is_completed(&work.local) {
                info!("[work {}] {} already completed, skipping", work_index, work.local);
                stats.skipped += 1;
                continue;
            }

            match self
                .work_processor
                .process(work, work_index, &mut checkpoint)
                .await
            {
                Ok(WorkOutcome::Processed { .. }) => stats.succeeded += 1,
                Ok(WorkOutcome::Empty) => stats.empty += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!("[work {}] ❌ {} failed: {}", work_index, work.local, e);
                    self.notifier
                        .notify(&format!("work {} failed: {}", work.local, e))
                        .await;

                    match self.failure_policy {
                        FailurePolicy::Abort => {
                            self.flush_catalog().await;
                            return Err(e);
                        }
                        FailurePolicy::SkipToNextWork => continue,
                    }
                }
            }
        }

        self.publisher.flush().await?;
        self.notifier.notify("OCR batch complete").await;
        log_final_stats(&stats);

        Ok(stats)
    }

    /// Buffered catalog updates are worth keeping even when aborting.
    async fn flush_catalog(&self) {
        if let Err(e) = self.publisher.flush().await {
            error!("catalog flush failed: {}", e);
        }
    }
}

// ========== log helpers ==========

fn log_batch_start(total: usize, policy: FailurePolicy) {
    info!("{}", "=".repeat(60));
    info!("🚀 batch start: {} works, failure policy {:?}", total, policy);
    info!("{}", "=".repeat(60));
}

fn log_final_stats(stats: &BatchStats) {
    info!("{}", "=".repeat(60));
    info!("📊 batch complete");
    info!(
        "✅ succeeded: {}/{} (skipped {}, empty {}, failed {})",
        stats.succeeded, stats.total, stats.skipped, stats.empty, stats.failed
    );
    info!("{}", "=".repeat(60));
}
