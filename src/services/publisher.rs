//! Downstream catalog publish step - capability layer
//!
//! The publish step turns a work's archived OCR output directory into the
//! distributable catalog format. It is a black box to the pipeline: it gets
//! a local directory path and may fail, and its failures propagate like any
//! other work failure. `flush` runs once after the whole batch to push any
//! buffered catalog updates.

use crate::error::PublishError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Catalog publish collaborator interface
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one work's archived OCR output directory.
    async fn publish(&self, work_local_id: &str, ocr_dir: &Path) -> Result<(), PublishError>;

    /// Flush buffered catalog updates at batch end.
    async fn flush(&self) -> Result<(), PublishError>;
}

/// `Publisher` that hands each work to an external command
///
/// The configured program is invoked as `<program> <ocr_dir>`; a non-zero
/// exit status is a publish failure. With no program configured the step
/// logs and succeeds, which keeps archive-only deployments runnable.
pub struct CommandPublisher {
    program: Option<String>,
}

impl CommandPublisher {
    pub fn new(program: Option<String>) -> Self {
        Self { program }
    }
}

#[async_trait]
impl Publisher for CommandPublisher {
    async fn publish(&self, work_local_id: &str, ocr_dir: &Path) -> Result<(), PublishError> {
        let Some(program) = &self.program else {
            debug!("no publish command configured, skipping {}", work_local_id);
            return Ok(());
        };

        info!("publishing {} from {}", work_local_id, ocr_dir.display());

        let status = Command::new(program)
            .arg(ocr_dir)
            .status()
            .await
            .map_err(|e| PublishError::failed(work_local_id, e.to_string()))?;

        if !status.success() {
            return Err(PublishError::failed(
                work_local_id,
                format!("{} exited with {}", program, status),
            ));
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), PublishError> {
        // the external command publishes synchronously, nothing is buffered
        Ok(())
    }
}
