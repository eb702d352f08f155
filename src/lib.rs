//! # BDRC OCR Archiver
//!
//! Batch pipeline that archives scanned manuscript images for a work,
//! extracts text from each page via an external OCR service and durably
//! archives images and OCR results to object storage — surviving crashes
//! and restarts without redoing completed work or duplicating output.
//!
//! ## Architecture
//!
//! The system is layered strictly, dependencies pointing downward:
//!
//! ### ① Clients
//! - `clients/` — external collaborator adapters behind trait seams:
//!   `MetadataClient` (work → volumes → images), `ArtifactStore`
//!   (exists/get/put over object storage), `OcrClient` (bytes in,
//!   text-annotation out)
//!
//! ### ② Services
//! - `services/` — single-unit capabilities: `StagingArea` (transient local
//!   cache with format normalization), `Publisher` (downstream catalog
//!   step), `Notifier` (progress messages)
//!
//! ### ③ Workflow
//! - `workflow/` — `VolumeFlow`, the fetch → OCR → archive → purge flow for
//!   one volume; every step independently skippable when its output exists
//!
//! ### ④ Orchestration
//! - `orchestrator/` — `WorkProcessor` (volume iteration + resume rule),
//!   `BatchDriver` (work-id list, checkpoint, failure policy),
//!   `Supervisor` (outer retry loop)
//!
//! Cross-cutting: `paths` (deterministic storage key derivation),
//! `checkpoint` (atomic progress persistence), `config`, `error`.

pub mod checkpoint;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod paths;
pub mod services;
pub mod utils;
pub mod workflow;

// re-export the common types
pub use checkpoint::{Checkpoint, CheckpointManager};
pub use clients::{
    ArtifactStore, BdrcMetadataClient, MetadataClient, ObjectStoreClient, OcrClient, OcrOutcome,
    VisionOcrClient,
};
pub use config::{Config, FailurePolicy};
pub use error::{PipelineError, PipelineResult};
pub use models::{ImageDescriptor, VolumeInfo, WorkId};
pub use orchestrator::{BatchDriver, BatchStats, RetryPolicy, Supervisor, WorkOutcome, WorkProcessor};
pub use services::{CommandPublisher, LogNotifier, Notifier, Publisher, SlackNotifier, StagingArea};
pub use workflow::{VolumeCtx, VolumeFlow, VolumeStats};
