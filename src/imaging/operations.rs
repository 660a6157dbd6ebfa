//! High-level image operations.
//!
//! These functions combine calculations with backend execution. Given the
//! source bytes of one image they produce both gallery rasters from a single
//! decode.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{plan_preview, plan_thumbnail};
use super::params::Quality;
use crate::types::EncodedRaster;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Thumbnail settings: square box size and encode quality.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailConfig {
    pub size: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            size: 250,
            quality: Quality::new(90),
        }
    }
}

/// Preview settings: bound on the longer edge and encode quality.
#[derive(Debug, Clone, Copy)]
pub struct PreviewConfig {
    pub size: u32,
    pub quality: Quality,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            size: 2000,
            quality: Quality::new(95),
        }
    }
}

/// Both rasters derived from one decode, plus the source dimensions.
#[derive(Debug, Clone)]
pub struct RenderedPair {
    pub source_width: u32,
    pub source_height: u32,
    pub thumbnail: EncodedRaster,
    pub preview: EncodedRaster,
}

/// Decode `bytes` once and derive the thumbnail and preview.
///
/// Any failure aborts the whole pair, so callers never see a thumbnail
/// without its preview.
pub fn render_variants<B: ImageBackend>(
    backend: &B,
    bytes: &[u8],
    thumbnail: &ThumbnailConfig,
    preview: &PreviewConfig,
) -> Result<RenderedPair> {
    let source = backend.decode(bytes)?;
    let dims = backend.dimensions(&source);
    if dims.width == 0 || dims.height == 0 {
        return Err(BackendError::Decode(format!(
            "Source has no pixels ({}x{})",
            dims.width, dims.height
        )));
    }

    let thumb = create_thumbnail(backend, &source, dims.as_tuple(), thumbnail)?;
    let prev = create_preview(backend, &source, dims.as_tuple(), preview)?;

    Ok(RenderedPair {
        source_width: dims.width,
        source_height: dims.height,
        thumbnail: thumb,
        preview: prev,
    })
}

/// Resize through the planned passes and encode the thumbnail.
pub fn create_thumbnail<B: ImageBackend>(
    backend: &B,
    source: &B::Raster,
    source_dims: (u32, u32),
    config: &ThumbnailConfig,
) -> Result<EncodedRaster> {
    let plan = plan_thumbnail(source_dims, config.size);

    let mut passes = plan.passes.iter();
    // The first pass reads from the decoded source, the rest chain
    let first = passes
        .next()
        .ok_or_else(|| BackendError::ProcessingFailed("Empty thumbnail plan".to_string()))?;
    let mut current = backend.resize(source, first)?;
    for pass in passes {
        current = backend.resize(&current, pass)?;
    }

    let target = plan.target();
    Ok(EncodedRaster {
        width: target.width,
        height: target.height,
        data: backend.encode(&current, config.quality)?,
    })
}

/// Bound the preview and encode it. Sources that already fit are encoded as-is.
pub fn create_preview<B: ImageBackend>(
    backend: &B,
    source: &B::Raster,
    source_dims: (u32, u32),
    config: &PreviewConfig,
) -> Result<EncodedRaster> {
    let plan = plan_preview(source_dims, config.size);

    let data = match plan.resize {
        Some(params) => {
            let resized = backend.resize(source, &params)?;
            backend.encode(&resized, config.quality)?
        }
        None => backend.encode(source, config.quality)?,
    };

    Ok(EncodedRaster {
        width: plan.width,
        height: plan.height,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn large_source_scenario() {
        let backend = MockBackend::new();
        let pair = render_variants(
            &backend,
            b"4000x3000",
            &ThumbnailConfig::default(),
            &PreviewConfig::default(),
        )
        .unwrap();

        assert_eq!((pair.source_width, pair.source_height), (4000, 3000));
        assert_eq!((pair.thumbnail.width, pair.thumbnail.height), (250, 188));
        assert_eq!((pair.preview.width, pair.preview.height), (2000, 1500));

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![
                RecordedOp::Decode { width: 4000, height: 3000 },
                RecordedOp::Resize { from: (4000, 3000), to: (500, 375) },
                RecordedOp::Resize { from: (500, 375), to: (250, 188) },
                RecordedOp::Encode { width: 250, height: 188, quality: 90 },
                RecordedOp::Resize { from: (4000, 3000), to: (2000, 1500) },
                RecordedOp::Encode { width: 2000, height: 1500, quality: 95 },
            ]
        );
    }

    #[test]
    fn small_source_scenario() {
        let backend = MockBackend::new();
        let pair = render_variants(
            &backend,
            b"200x150",
            &ThumbnailConfig::default(),
            &PreviewConfig::default(),
        )
        .unwrap();

        assert_eq!((pair.thumbnail.width, pair.thumbnail.height), (250, 188));
        assert_eq!((pair.preview.width, pair.preview.height), (200, 150));

        let ops = backend.get_operations();
        assert_eq!(backend.decode_count(), 1);
        // One thumbnail pass, preview encoded straight from the source
        assert_eq!(
            ops[1..],
            [
                RecordedOp::Resize { from: (200, 150), to: (250, 188) },
                RecordedOp::Encode { width: 250, height: 188, quality: 90 },
                RecordedOp::Encode { width: 200, height: 150, quality: 95 },
            ]
        );
    }

    #[test]
    fn custom_sizes_are_honoured() {
        let backend = MockBackend::new();
        let pair = render_variants(
            &backend,
            b"1200x1600",
            &ThumbnailConfig {
                size: 100,
                quality: Quality::new(80),
            },
            &PreviewConfig {
                size: 800,
                quality: Quality::new(85),
            },
        )
        .unwrap();

        assert_eq!((pair.thumbnail.width, pair.thumbnail.height), (75, 100));
        assert_eq!((pair.preview.width, pair.preview.height), (600, 800));
    }

    #[test]
    fn decode_failure_produces_nothing() {
        let backend = MockBackend::new();
        let result = render_variants(
            &backend,
            b"corrupt",
            &ThumbnailConfig::default(),
            &PreviewConfig::default(),
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn zero_sized_source_is_rejected() {
        let backend = MockBackend::new();
        let result = render_variants(
            &backend,
            b"0x300",
            &ThumbnailConfig::default(),
            &PreviewConfig::default(),
        );
        assert!(result.is_err());
    }
}
