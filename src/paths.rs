//! Storage key derivation
//!
//! Keys are derived only from (work id, imagegroup, purpose, filename), never
//! from random or time-based input, so two independent runs against the same
//! inputs compute identical keys. The layout follows the BDRC archive schema:
//! works are spread over a flat namespace by the first two hex characters of
//! the md5 of the work's local id.

use regex::Regex;
use std::sync::OnceLock;

/// Service name used for OCR output paths
pub const SERVICE: &str = "vision";
/// Batch directory prefix; a single fixed batch index is used
pub const BATCH_DIR: &str = "batch001";
/// Images subfolder name, local and remote
pub const IMAGES: &str = "images";
/// OCR output subfolder name, local and remote
pub const OUTPUT: &str = "output";
/// Per-batch manifest filename
pub const INFO_FN: &str = "info.json";

fn group_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^I(\d{4})$").expect("valid regex"))
}

/// First two hex characters of the md5 of the work's local id.
fn hash_bucket(work_local_id: &str) -> String {
    let digest = md5::compute(work_local_id.as_bytes());
    format!("{:x}", digest)[..2].to_string()
}

/// Normalized imagegroup suffix: `I` plus exactly four digits loses the
/// prefix, anything else is used verbatim.
fn group_suffix(imagegroup: &str) -> &str {
    match group_pattern().captures(imagegroup) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(imagegroup),
        None => imagegroup,
    }
}

/// Key prefixes for one volume's OCR service output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServicePaths {
    /// `Works/<xx>/<work>/vision/batch001`
    pub batch_dir: String,
    /// Normalized image destinations under the batch dir
    pub images: String,
    /// OCR output destinations under the batch dir
    pub output: String,
}

impl ServicePaths {
    /// Key of the per-batch `info.json` manifest
    pub fn info_key(&self) -> String {
        format!("{}/{}", self.batch_dir, INFO_FN)
    }
}

fn base_dir(work_local_id: &str) -> String {
    format!("Works/{}/{}", hash_bucket(work_local_id), work_local_id)
}

/// Prefix of the original source images in the archive bucket.
pub fn source_image_prefix(work_local_id: &str, imagegroup: &str) -> String {
    format!(
        "{}/{}/{}-{}",
        base_dir(work_local_id),
        IMAGES,
        work_local_id,
        group_suffix(imagegroup)
    )
}

/// Prefixes for the OCR output bucket (normalized images, OCR results,
/// batch manifest).
pub fn service_paths(work_local_id: &str, imagegroup: &str) -> ServicePaths {
    let batch_dir = format!("{}/{}/{}", base_dir(work_local_id), SERVICE, BATCH_DIR);
    let suffix = group_suffix(imagegroup);
    ServicePaths {
        images: format!("{}/{}/{}-{}", batch_dir, IMAGES, work_local_id, suffix),
        output: format!("{}/{}/{}-{}", batch_dir, OUTPUT, work_local_id, suffix),
        batch_dir,
    }
}
