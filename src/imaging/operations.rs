//! High-level image operations.
//!
//! These functions combine the pure calculations with the `image` crate:
//! cover-resizing, decoding, encoding, and atomic writes to disk.

use super::calculations::{calculate_aspect_crop, calculate_crop_offset};
use super::params::{Gravity, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// Resize to cover `target` exactly, cropping the surplus according to `gravity`.
///
/// Equivalent to a CSS `object-fit: cover` with an `object-position`. The
/// source is cropped to the target aspect ratio before resampling, so memory
/// stays bounded by the larger of source and target.
pub fn resize_cover(img: &RgbImage, target: (u32, u32), gravity: Gravity) -> RgbImage {
    if img.dimensions() == target {
        return img.clone();
    }
    let (crop_w, crop_h) = calculate_aspect_crop(img.dimensions(), target);
    let (x, y) = calculate_crop_offset(img.dimensions(), (crop_w, crop_h), gravity);
    let cropped = imageops::crop_imm(img, x, y, crop_w, crop_h).to_image();
    imageops::resize(&cropped, target.0, target.1, FilterType::Lanczos3)
}

/// Decode an in-memory image of any compiled-in format to RGB8.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| ImagingError::ProcessingFailed(format!("Failed to decode image: {}", e)))
}

/// Load and decode an image from disk to RGB8.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let bytes = std::fs::read(path)?;
    decode_rgb(&bytes).map_err(|e| match e {
        ImagingError::ProcessingFailed(msg) => {
            ImagingError::ProcessingFailed(format!("{} ({})", msg, path.display()))
        }
        other => other,
    })
}

/// Encode as baseline JPEG.
pub fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.as_u8());
    img.write_with_encoder(encoder)
        .map_err(|e| ImagingError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(bytes)
}

/// Encode as lossless PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new(&mut bytes);
    img.write_with_encoder(encoder)
        .map_err(|e| ImagingError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
    Ok(bytes)
}

/// Write `bytes` to `path` via a temp file in the same directory and a rename.
///
/// Parent directories are created. An existing file at `path` is replaced;
/// readers never observe a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ImagingError::Io(e.error))?;
    Ok(())
}
