/// What the batch driver does when a work fails
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole batch on the first work failure
    Abort,
    /// Record the failure and move on to the next work id
    SkipToNextWork,
}

impl FailurePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "abort" => Some(FailurePolicy::Abort),
            "skip" | "skip_to_next_work" => Some(FailurePolicy::SkipToNextWork),
            _ => None,
        }
    }
}

/// Pipeline configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// File holding the ordered list of work ids, one per line
    pub input_list_path: String,
    /// Root of the local staging area
    pub staging_dir: String,
    /// Checkpoint file path
    pub checkpoint_path: String,
    /// Read-only bucket holding the original source images
    pub archive_bucket: String,
    /// Read/write bucket holding normalized images and OCR output
    pub ocr_output_bucket: String,
    /// Base URL of the work metadata endpoint
    pub metadata_base_url: String,
    /// Base URL of the per-volume image list endpoint
    pub image_list_base_url: String,
    /// Vision API endpoint
    pub vision_endpoint: String,
    /// Vision API key
    pub vision_api_key: String,
    /// Parallel OCR requests within one volume
    pub ocr_concurrency: usize,
    /// What to do when a work fails
    pub failure_policy: FailurePolicy,
    /// Supervisor: how many times to re-run a failed batch
    pub max_batch_attempts: u32,
    /// Supervisor: seconds of backoff between batch attempts
    pub retry_backoff_secs: u64,
    /// Command invoked with a work's OCR output directory (catalog publish)
    pub publish_command: Option<String>,
    /// Slack webhook for progress notifications (log-only when unset)
    pub slack_webhook_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_list_path: "input/works.txt".to_string(),
            staging_dir: "archive".to_string(),
            checkpoint_path: "archive/checkpoint.json".to_string(),
            archive_bucket: "archive.tbrc.org".to_string(),
            ocr_output_bucket: "ocr.bdrc.io".to_string(),
            metadata_base_url: "http://purl.bdrc.io".to_string(),
            image_list_base_url: "https://iiifpres.bdrc.io".to_string(),
            vision_endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            vision_api_key: String::new(),
            ocr_concurrency: 8,
            failure_policy: FailurePolicy::Abort,
            max_batch_attempts: 3,
            retry_backoff_secs: 60,
            publish_command: None,
            slack_webhook_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_list_path: std::env::var("INPUT_LIST_PATH").unwrap_or(default.input_list_path),
            staging_dir: std::env::var("STAGING_DIR").unwrap_or(default.staging_dir),
            checkpoint_path: std::env::var("CHECKPOINT_PATH").unwrap_or(default.checkpoint_path),
            archive_bucket: std::env::var("ARCHIVE_BUCKET").unwrap_or(default.archive_bucket),
            ocr_output_bucket: std::env::var("OCR_OUTPUT_BUCKET").unwrap_or(default.ocr_output_bucket),
            metadata_base_url: std::env::var("METADATA_BASE_URL").unwrap_or(default.metadata_base_url),
            image_list_base_url: std::env::var("IMAGE_LIST_BASE_URL").unwrap_or(default.image_list_base_url),
            vision_endpoint: std::env::var("VISION_ENDPOINT").unwrap_or(default.vision_endpoint),
            vision_api_key: std::env::var("VISION_API_KEY").unwrap_or(default.vision_api_key),
            ocr_concurrency: std::env::var("OCR_CONCURRENCY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.ocr_concurrency),
            failure_policy: std::env::var("FAILURE_POLICY").ok().and_then(|v| FailurePolicy::parse(&v)).unwrap_or(default.failure_policy),
            max_batch_attempts: std::env::var("MAX_BATCH_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_batch_attempts),
            retry_backoff_secs: std::env::var("RETRY_BACKOFF_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_backoff_secs),
            publish_command: std::env::var("PUBLISH_COMMAND").ok(),
            slack_webhook_url: std::env::var("SLACK_WEBHOOK_URL").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!(FailurePolicy::parse("abort"), Some(FailurePolicy::Abort));
        assert_eq!(FailurePolicy::parse("Skip"), Some(FailurePolicy::SkipToNextWork));
        assert_eq!(FailurePolicy::parse("nope"), None);
    }

    #[test]
    fn test_default_buckets() {
        let config = Config::default();
        assert_eq!(config.archive_bucket, "archive.tbrc.org");
        assert_eq!(config.ocr_output_bucket, "ocr.bdrc.io");
    }
}
