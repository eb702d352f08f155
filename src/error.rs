use std::fmt;

/// Top-level pipeline error type
#[derive(Debug)]
pub enum PipelineError {
    /// Metadata service errors (volume / image list lookups)
    Metadata(MetadataError),
    /// Object storage errors
    Storage(StorageError),
    /// OCR service errors
    Ocr(OcrError),
    /// Local staging area errors
    Staging(StagingError),
    /// Checkpoint persistence errors
    Checkpoint(CheckpointError),
    /// Downstream catalog publish errors
    Publish(PublishError),
    /// Configuration errors
    Config(ConfigError),
    /// Anything else (wraps third-party errors)
    Other(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Metadata(e) => write!(f, "metadata error: {}", e),
            PipelineError::Storage(e) => write!(f, "storage error: {}", e),
            PipelineError::Ocr(e) => write!(f, "ocr error: {}", e),
            PipelineError::Staging(e) => write!(f, "staging error: {}", e),
            PipelineError::Checkpoint(e) => write!(f, "checkpoint error: {}", e),
            PipelineError::Publish(e) => write!(f, "publish error: {}", e),
            PipelineError::Config(e) => write!(f, "config error: {}", e),
            PipelineError::Other(msg) => write!(f, "error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Metadata(e) => Some(e),
            PipelineError::Storage(e) => Some(e),
            PipelineError::Ocr(e) => Some(e),
            PipelineError::Staging(e) => Some(e),
            PipelineError::Checkpoint(e) => Some(e),
            PipelineError::Publish(e) => Some(e),
            PipelineError::Config(e) => Some(e),
            PipelineError::Other(_) => None,
        }
    }
}

/// Metadata service errors
#[derive(Debug)]
pub enum MetadataError {
    /// The remote list call failed (non-success response or transport error)
    Unavailable {
        resource: String,
        detail: String,
    },
    /// The response body could not be decoded
    BadResponse {
        resource: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::Unavailable { resource, detail } => {
                write!(f, "metadata unavailable for {}: {}", resource, detail)
            }
            MetadataError::BadResponse { resource, source } => {
                write!(f, "bad metadata response for {}: {}", resource, source)
            }
        }
    }
}

impl std::error::Error for MetadataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetadataError::BadResponse { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// Object storage errors
#[derive(Debug)]
pub enum StorageError {
    /// The object does not exist
    NotFound {
        key: String,
    },
    /// The request to the store failed
    RequestFailed {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound { key } => write!(f, "object not found: {}", key),
            StorageError::RequestFailed { key, source } => {
                write!(f, "storage request failed ({}): {}", key, source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::RequestFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// OCR service errors
#[derive(Debug)]
pub enum OcrError {
    /// Transport or service error; retryable later, never fatal for a volume
    Service {
        detail: String,
    },
    /// The service answered but the response could not be decoded
    BadResponse {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrError::Service { detail } => write!(f, "ocr service error: {}", detail),
            OcrError::BadResponse { source } => write!(f, "bad ocr response: {}", source),
        }
    }
}

impl std::error::Error for OcrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OcrError::BadResponse { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// Local staging area errors
#[derive(Debug)]
pub enum StagingError {
    /// Filesystem failure; fatal for the current volume
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The downloaded bytes are not a decodable image; the page is skipped
    Decode {
        path: String,
        detail: String,
    },
}

impl fmt::Display for StagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingError::Io { path, source } => {
                write!(f, "staging io failed ({}): {}", path, source)
            }
            StagingError::Decode { path, detail } => {
                write!(f, "undecodable image ({}): {}", path, detail)
            }
        }
    }
}

impl std::error::Error for StagingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StagingError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Checkpoint persistence errors
#[derive(Debug)]
pub enum CheckpointError {
    /// Reading or writing the checkpoint file failed
    Io {
        path: String,
        source: std::io::Error,
    },
    /// The checkpoint file exists but is not valid JSON
    Corrupt {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io { path, source } => {
                write!(f, "checkpoint io failed ({}): {}", path, source)
            }
            CheckpointError::Corrupt { path, source } => {
                write!(f, "corrupt checkpoint ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io { source, .. } => Some(source),
            CheckpointError::Corrupt { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// Downstream catalog publish errors
#[derive(Debug)]
pub enum PublishError {
    /// The publish step failed for a work; archived volumes stay archived
    Failed {
        work: String,
        detail: String,
    },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Failed { work, detail } => {
                write!(f, "publish failed for {}: {}", work, detail)
            }
        }
    }
}

impl std::error::Error for PublishError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected,
            } => {
                write!(
                    f,
                    "env var {} parse failed: '{}' is not a valid {}",
                    var_name, value, expected
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== conversions from component errors ==========

impl From<MetadataError> for PipelineError {
    fn from(err: MetadataError) -> Self {
        PipelineError::Metadata(err)
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        PipelineError::Storage(err)
    }
}

impl From<OcrError> for PipelineError {
    fn from(err: OcrError) -> Self {
        PipelineError::Ocr(err)
    }
}

impl From<StagingError> for PipelineError {
    fn from(err: StagingError) -> Self {
        PipelineError::Staging(err)
    }
}

impl From<CheckpointError> for PipelineError {
    fn from(err: CheckpointError) -> Self {
        PipelineError::Checkpoint(err)
    }
}

impl From<PublishError> for PipelineError {
    fn from(err: PublishError) -> Self {
        PipelineError::Publish(err)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

// ========== convenience constructors ==========

impl StagingError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StagingError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<String>, detail: impl Into<String>) -> Self {
        StagingError::Decode {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

impl MetadataError {
    pub fn unavailable(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        MetadataError::Unavailable {
            resource: resource.into(),
            detail: detail.into(),
        }
    }
}

impl StorageError {
    pub fn request_failed(
        key: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::RequestFailed {
            key: key.into(),
            source: Box::new(source),
        }
    }
}

impl OcrError {
    pub fn service(detail: impl Into<String>) -> Self {
        OcrError::Service {
            detail: detail.into(),
        }
    }
}

impl PublishError {
    pub fn failed(work: impl Into<String>, detail: impl Into<String>) -> Self {
        PublishError::Failed {
            work: work.into(),
            detail: detail.into(),
        }
    }
}

// ========== Result type alias ==========

/// Pipeline result type
pub type PipelineResult<T> = Result<T, PipelineError>;
