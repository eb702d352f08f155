//! Local staging area - capability layer
//!
//! Transient on-disk cache of downloaded images and OCR outputs, bounded by
//! per-volume cleanup. Layout mirrors the remote schema:
//!
//! - `<root>/images/<work>/<imagegroup>/<filename>` — normalized page images
//! - `<root>/output/<work>/<imagegroup>/<stem>.json.gz` — compressed OCR
//!
//! Staging normalizes source formats for the OCR service: `.tif` containers
//! are re-encoded as `.png`, and a fixed deterministic autocontrast transform
//! (0.5% histogram cutoff per channel) is applied to every page. Staging the
//! same filename twice is a no-op; purging a missing path is not an error.

use crate::error::StagingError;
use crate::paths::{IMAGES, OUTPUT};
use flate2::write::GzEncoder;
use flate2::Compression;
use image::{DynamicImage, RgbImage};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Permille of pixels clipped from each histogram end before remapping
const AUTOCONTRAST_CUTOFF_PERMILLE: u32 = 5;

/// Local staging area rooted at a configured directory
#[derive(Clone, Debug)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filename stem up to the first dot.
    fn stem(filename: &str) -> &str {
        filename.split('.').next().unwrap_or(filename)
    }

    /// Name the image is staged under; `.tif` sources become `.png`.
    pub fn staged_name(filename: &str) -> String {
        if filename.ends_with(".tif") {
            format!("{}.png", Self::stem(filename))
        } else {
            filename.to_string()
        }
    }

    /// Name of the compressed OCR output for a page.
    pub fn ocr_output_name(filename: &str) -> String {
        format!("{}.json.gz", Self::stem(filename))
    }

    pub fn images_dir(&self, work_local_id: &str, imagegroup: &str) -> PathBuf {
        self.root.join(IMAGES).join(work_local_id).join(imagegroup)
    }

    pub fn output_dir(&self, work_local_id: &str, imagegroup: &str) -> PathBuf {
        self.root.join(OUTPUT).join(work_local_id).join(imagegroup)
    }

    /// The work's whole OCR output subtree; handed to the publish step.
    pub fn ocr_work_dir(&self, work_local_id: &str) -> PathBuf {
        self.root.join(OUTPUT).join(work_local_id)
    }

    fn staged_path(&self, work_local_id: &str, imagegroup: &str, filename: &str) -> PathBuf {
        self.images_dir(work_local_id, imagegroup)
            .join(Self::staged_name(filename))
    }

    fn ocr_output_path(&self, work_local_id: &str, imagegroup: &str, filename: &str) -> PathBuf {
        self.output_dir(work_local_id, imagegroup)
            .join(Self::ocr_output_name(filename))
    }

    /// True when the page needs no download: either its staged image or its
    /// local OCR output already exists.
    pub fn image_exists(&self, work_local_id: &str, imagegroup: &str, filename: &str) -> bool {
        self.staged_path(work_local_id, imagegroup, filename).is_file()
            || self.ocr_exists(work_local_id, imagegroup, filename)
    }

    pub fn ocr_exists(&self, work_local_id: &str, imagegroup: &str, filename: &str) -> bool {
        self.ocr_output_path(work_local_id, imagegroup, filename)
            .is_file()
    }

    /// Normalize and stage one downloaded page image. No-op when the target
    /// already exists. Undecodable bytes are a `Decode` error so the caller
    /// can skip the page; filesystem failures are `Io`.
    pub fn stage_image(
        &self,
        work_local_id: &str,
        imagegroup: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StagingError> {
        let target = self.staged_path(work_local_id, imagegroup, filename);
        if target.is_file() {
            return Ok(());
        }

        let target_str = target.display().to_string();

        if bytes.is_empty() {
            return Err(StagingError::decode(target_str, "empty bytes"));
        }

        let img = image::load_from_memory(bytes)
            .map_err(|e| StagingError::decode(&target_str, e.to_string()))?;
        let img = autocontrast(&img, AUTOCONTRAST_CUTOFF_PERMILLE);

        let dir = target.parent().expect("staged path has a parent");
        fs::create_dir_all(dir).map_err(|e| StagingError::io(dir.display().to_string(), e))?;

        img.save(&target).map_err(|e| {
            StagingError::io(
                &target_str,
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )
        })?;

        Ok(())
    }

    /// Gzip-compress and persist one page's OCR result JSON.
    pub fn write_ocr_output(
        &self,
        work_local_id: &str,
        imagegroup: &str,
        filename: &str,
        json: &str,
    ) -> Result<(), StagingError> {
        let target = self.ocr_output_path(work_local_id, imagegroup, filename);
        let dir = target.parent().expect("output path has a parent");
        fs::create_dir_all(dir).map_err(|e| StagingError::io(dir.display().to_string(), e))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        let io_err = |e| StagingError::io(target.display().to_string(), e);
        encoder.write_all(json.as_bytes()).map_err(io_err)?;
        let compressed = encoder.finish().map_err(io_err)?;

        fs::write(&target, compressed)
            .map_err(|e| StagingError::io(target.display().to_string(), e))?;
        Ok(())
    }

    /// Staged images of one volume, `(filename, path)` sorted by name.
    pub fn list_staged_images(
        &self,
        work_local_id: &str,
        imagegroup: &str,
    ) -> Result<Vec<(String, PathBuf)>, StagingError> {
        list_files(&self.images_dir(work_local_id, imagegroup))
    }

    /// OCR outputs of one volume, `(filename, path)` sorted by name.
    pub fn list_ocr_outputs(
        &self,
        work_local_id: &str,
        imagegroup: &str,
    ) -> Result<Vec<(String, PathBuf)>, StagingError> {
        list_files(&self.output_dir(work_local_id, imagegroup))
    }

    pub fn read_file(&self, path: &Path) -> Result<Vec<u8>, StagingError> {
        fs::read(path).map_err(|e| StagingError::io(path.display().to_string(), e))
    }

    /// Delete one archived volume's staged images.
    pub fn purge_volume(&self, work_local_id: &str, imagegroup: &str) -> Result<(), StagingError> {
        remove_dir(&self.images_dir(work_local_id, imagegroup))
    }

    /// Delete one published work's OCR output subtree.
    pub fn purge_work(&self, work_local_id: &str) -> Result<(), StagingError> {
        remove_dir(&self.ocr_work_dir(work_local_id))
    }

    /// Delete every staged image and OCR output.
    pub fn purge_all(&self) -> Result<(), StagingError> {
        remove_dir(&self.root.join(IMAGES))?;
        remove_dir(&self.root.join(OUTPUT))
    }
}

fn list_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, StagingError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries =
        fs::read_dir(dir).map_err(|e| StagingError::io(dir.display().to_string(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StagingError::io(dir.display().to_string(), e))?;
        let path = entry.path();
        if path.is_file() {
            files.push((entry.file_name().to_string_lossy().to_string(), path));
        }
    }
    files.sort();
    Ok(files)
}

fn remove_dir(dir: &Path) -> Result<(), StagingError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StagingError::io(dir.display().to_string(), e)),
    }
}

/// Fixed autocontrast: clip `cutoff_permille` of pixels from each end of the
/// per-channel histogram and remap the rest linearly to the full range.
/// Integer math only, so the transform is deterministic across runs.
fn autocontrast(img: &DynamicImage, cutoff_permille: u32) -> DynamicImage {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let total = u64::from(width) * u64::from(height);
    if total == 0 {
        return DynamicImage::ImageRgb8(rgb);
    }

    let mut bounds = [(0u8, 255u8); 3];
    for channel in 0..3 {
        let mut histogram = [0u64; 256];
        for pixel in rgb.pixels() {
            histogram[pixel.0[channel] as usize] += 1;
        }
        bounds[channel] = channel_bounds(&histogram, total, cutoff_permille);
    }

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let mut mapped = [0u8; 3];
        for channel in 0..3 {
            let (lo, hi) = bounds[channel];
            mapped[channel] = remap(pixel.0[channel], lo, hi);
        }
        out.put_pixel(x, y, image::Rgb(mapped));
    }
    DynamicImage::ImageRgb8(out)
}

fn channel_bounds(histogram: &[u64; 256], total: u64, cutoff_permille: u32) -> (u8, u8) {
    let cut = total * u64::from(cutoff_permille) / 1000;

    let mut lo = 0usize;
    let mut seen = 0u64;
    while lo < 255 {
        seen += histogram[lo];
        if seen > cut {
            break;
        }
        lo += 1;
    }

    let mut hi = 255usize;
    let mut seen = 0u64;
    while hi > 0 {
        seen += histogram[hi];
        if seen > cut {
            break;
        }
        hi -= 1;
    }

    if hi <= lo {
        (0, 255)
    } else {
        (lo as u8, hi as u8)
    }
}

fn remap(value: u8, lo: u8, hi: u8) -> u8 {
    let value = value.clamp(lo, hi);
    let range = u32::from(hi) - u32::from(lo);
    if range == 0 {
        return value;
    }
    ((u32::from(value - lo) * 255 + range / 2) / range) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::{Cursor, Read};

    fn png_bytes() -> Vec<u8> {
        let mut img = RgbImage::new(4, 4);
        for (i, pixel) in img.pixels_mut().enumerate() {
            let v = (i * 16) as u8;
            *pixel = image::Rgb([v, v, v]);
        }
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_staged_name_maps_tif_to_png() {
        assert_eq!(StagingArea::staged_name("p001.tif"), "p001.png");
        assert_eq!(StagingArea::staged_name("p001.jpg"), "p001.jpg");
    }

    #[test]
    fn test_ocr_output_name() {
        assert_eq!(StagingArea::ocr_output_name("p001.tif"), "p001.json.gz");
        assert_eq!(StagingArea::ocr_output_name("p001.png"), "p001.json.gz");
    }

    #[test]
    fn test_stage_image_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        assert!(!staging.image_exists("W1", "I0001", "p1.png"));
        staging.stage_image("W1", "I0001", "p1.png", &png_bytes()).unwrap();
        assert!(staging.image_exists("W1", "I0001", "p1.png"));

        let staged = staging.list_staged_images("W1", "I0001").unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].0, "p1.png");
    }

    #[test]
    fn test_stage_image_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        staging.stage_image("W1", "I0001", "p1.png", &png_bytes()).unwrap();
        // second call with garbage bytes must not touch the existing file
        staging.stage_image("W1", "I0001", "p1.png", b"garbage").unwrap();
        assert!(staging.image_exists("W1", "I0001", "p1.png"));
    }

    #[test]
    fn test_stage_undecodable_bytes_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        match staging.stage_image("W1", "I0001", "p1.png", b"not an image") {
            Err(StagingError::Decode { .. }) => {}
            other => panic!("expected Decode error, got {:?}", other),
        }
        match staging.stage_image("W1", "I0001", "p1.png", b"") {
            Err(StagingError::Decode { .. }) => {}
            other => panic!("expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_ocr_output_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        staging
            .write_ocr_output("W1", "I0001", "p1.png", r#"{"text":"ka"}"#)
            .unwrap();
        assert!(staging.ocr_exists("W1", "I0001", "p1.png"));

        let outputs = staging.list_ocr_outputs("W1", "I0001").unwrap();
        assert_eq!(outputs[0].0, "p1.json.gz");

        let compressed = staging.read_file(&outputs[0].1).unwrap();
        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut json = String::new();
        decoder.read_to_string(&mut json).unwrap();
        assert_eq!(json, r#"{"text":"ka"}"#);
    }

    #[test]
    fn test_image_exists_when_only_ocr_output_present() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        staging.write_ocr_output("W1", "I0001", "p1.tif", "{}").unwrap();
        // processed page does not need its image re-downloaded
        assert!(staging.image_exists("W1", "I0001", "p1.tif"));
    }

    #[test]
    fn test_purge_volume_and_work() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());

        staging.stage_image("W1", "I0001", "p1.png", &png_bytes()).unwrap();
        staging.write_ocr_output("W1", "I0001", "p1.png", "{}").unwrap();

        staging.purge_volume("W1", "I0001").unwrap();
        assert!(!staging.images_dir("W1", "I0001").exists());
        assert!(staging.ocr_exists("W1", "I0001", "p1.png"));

        staging.purge_work("W1").unwrap();
        assert!(!staging.ocr_work_dir("W1").exists());
    }

    #[test]
    fn test_purge_missing_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path());
        staging.purge_volume("W404", "I0001").unwrap();
        staging.purge_work("W404").unwrap();
        staging.purge_all().unwrap();
    }

    #[test]
    fn test_autocontrast_is_deterministic_and_stretches() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgb([100, 100, 100]));
        img.put_pixel(1, 0, image::Rgb([150, 150, 150]));
        img.put_pixel(0, 1, image::Rgb([120, 120, 120]));
        img.put_pixel(1, 1, image::Rgb([140, 140, 140]));
        let img = DynamicImage::ImageRgb8(img);

        let a = autocontrast(&img, 5).to_rgb8();
        let b = autocontrast(&img, 5).to_rgb8();
        assert_eq!(a.as_raw(), b.as_raw());

        // narrow range is stretched to the full scale
        assert_eq!(a.get_pixel(0, 0).0[0], 0);
        assert_eq!(a.get_pixel(1, 0).0[0], 255);
    }
}
