//! Shared test utilities for the gallery test suite.
//!
//! Provides synthetic image encoders, on-disk fixture builders and
//! descriptor shortcuts.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_test_jpeg(tmp.path(), "oak.jpg", 1200, 900);
//! let descriptors = descriptors(&[("oak", "oak.jpg")]);
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};

use crate::types::ImageDescriptor;

pub use tempfile::TempDir;

// =========================================================================
// Synthetic images
// =========================================================================

/// Encode a `width`×`height` RGB gradient as JPEG.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 85)
        .encode_image(&img)
        .unwrap();
    buf
}

/// Encode a `width`×`height` half-transparent RGBA gradient as PNG.
pub fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 128])
    });
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    buf
}

// =========================================================================
// Fixture files
// =========================================================================

/// Write a synthetic JPEG under `dir` and return its path.
pub fn write_test_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    write_bytes(dir, name, &encode_test_jpeg(width, height))
}

/// Write a synthetic PNG under `dir` and return its path.
pub fn write_test_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    write_bytes(dir, name, &encode_test_png(width, height))
}

/// Write arbitrary bytes under `dir`, creating parent directories.
pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

// =========================================================================
// Descriptors
// =========================================================================

/// Descriptors from `(id, url)` pairs; the display name is the id.
pub fn descriptors(pairs: &[(&str, &str)]) -> Vec<ImageDescriptor> {
    pairs
        .iter()
        .map(|(id, url)| ImageDescriptor::new(*id, *url, *id))
        .collect()
}

/// All ids in order.
pub fn ids(descriptors: &[ImageDescriptor]) -> Vec<&str> {
    descriptors.iter().map(|d| d.id.as_str()).collect()
}
