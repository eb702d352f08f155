//! Outer retry loop
//!
//! The pipeline core only reports typed failures; deciding whether a failed
//! batch is worth another pass lives here, outside the core. A re-run is
//! safe by construction: it resumes from the checkpoint and repeats no
//! completed upload.

use crate::error::PipelineResult;
use crate::orchestrator::batch_driver::{BatchDriver, BatchStats};
use std::time::Duration;
use tracing::{error, info};

/// When and how often to re-run a failed batch
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Re-invokes the batch driver until it succeeds or attempts run out
pub struct Supervisor {
    driver: BatchDriver,
    policy: RetryPolicy,
}

impl Supervisor {
    pub fn new(driver: BatchDriver, policy: RetryPolicy) -> Self {
        Self { driver, policy }
    }

    pub async fn run(self) -> PipelineResult<BatchStats> {
        let mut attempt = 1;
        loop {
            match self.driver.run().await {
                Ok(stats) => return Ok(stats),
                Err(e) if attempt < self.policy.max_attempts => {
                    let backoff = self.policy.backoff * attempt;
                    error!(
                        "batch attempt {}/{} failed: {}",
                        attempt, self.policy.max_attempts, e
                    );
                    info!("retrying in {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("batch failed after {} attempts: {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }
}
