//! External collaborator adapters
//!
//! Each client is constructed once at batch start and passed down through
//! the work/volume processors; the pipeline never reconstructs one mid-run.

pub mod metadata;
pub mod ocr;
pub mod storage;

pub use metadata::{BdrcMetadataClient, MetadataClient};
pub use ocr::{OcrClient, OcrOutcome, VisionOcrClient};
pub use storage::{ArtifactStore, ObjectStoreClient};
