use anyhow::Result;
use bdrc_ocr_archiver::clients::{BdrcMetadataClient, ObjectStoreClient, VisionOcrClient};
use bdrc_ocr_archiver::services::{
    CommandPublisher, LogNotifier, Notifier, Publisher, SlackNotifier, StagingArea,
};
use bdrc_ocr_archiver::utils::logging;
use bdrc_ocr_archiver::{
    BatchDriver, Config, PipelineResult, RetryPolicy, Supervisor, WorkProcessor,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::from_env();

    let driver = build_driver(&config)?;
    let policy = RetryPolicy::new(
        config.max_batch_attempts,
        Duration::from_secs(config.retry_backoff_secs),
    );

    let stats = Supervisor::new(driver, policy).run().await?;
    tracing::info!(
        "done: {} succeeded, {} failed, {} skipped",
        stats.succeeded,
        stats.failed,
        stats.skipped
    );

    Ok(())
}

/// Construct every collaborator once and wire the driver. Clients live for
/// the whole process and are passed down, never rebuilt mid-pipeline.
fn build_driver(config: &Config) -> PipelineResult<BatchDriver> {
    let metadata = Arc::new(BdrcMetadataClient::new(
        &config.metadata_base_url,
        &config.image_list_base_url,
    ));
    let archive_store = Arc::new(ObjectStoreClient::s3(&config.archive_bucket)?);
    let ocr_store = Arc::new(ObjectStoreClient::s3(&config.ocr_output_bucket)?);
    let ocr = Arc::new(VisionOcrClient::new(
        &config.vision_endpoint,
        &config.vision_api_key,
    ));
    let staging = StagingArea::new(&config.staging_dir);

    let publisher: Arc<dyn Publisher> =
        Arc::new(CommandPublisher::new(config.publish_command.clone()));
    let notifier: Arc<dyn Notifier> = match &config.slack_webhook_url {
        Some(url) => Arc::new(SlackNotifier::new(url)),
        None => Arc::new(LogNotifier),
    };

    let work_processor = WorkProcessor::new(
        metadata,
        archive_store,
        ocr_store,
        ocr,
        staging,
        publisher.clone(),
        notifier.clone(),
        config.ocr_concurrency,
    );

    Ok(BatchDriver::new(work_processor, publisher, notifier, config))
}
