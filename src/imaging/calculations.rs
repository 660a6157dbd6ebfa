//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{PreviewPlan, ResizeParams, ThumbnailPlan};

/// A source whose longer edge exceeds `box × MULTI_PASS_FACTOR` is
/// downsampled in two passes.
pub const MULTI_PASS_FACTOR: u32 = 4;

/// The intermediate pass targets `box × INTERMEDIATE_FACTOR` on the longer edge.
pub const INTERMEDIATE_FACTOR: u32 = 2;

/// Fit `source` into a `box_size × box_size` square, preserving aspect ratio.
///
/// The longer edge maps to `box_size`; the shorter edge scales proportionally
/// and is rounded, never below 1px. Sources smaller than the box are scaled up.
///
/// # Examples
/// ```
/// # use adaptive_gallery::imaging::fit_within_box;
/// assert_eq!(fit_within_box((4000, 3000), 250), (250, 188));
/// assert_eq!(fit_within_box((600, 1200), 250), (125, 250));
/// ```
pub fn fit_within_box(source: (u32, u32), box_size: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if src_w >= src_h {
        // Landscape or square: width is the long edge
        let h = (box_size as f64 * src_h as f64 / src_w as f64).round() as u32;
        (box_size, h.max(1))
    } else {
        let w = (box_size as f64 * src_w as f64 / src_h as f64).round() as u32;
        (w.max(1), box_size)
    }
}

/// Whether a source is large enough to need the intermediate pass.
pub fn needs_multi_pass(source: (u32, u32), box_size: u32) -> bool {
    let longer = source.0.max(source.1) as u64;
    longer > box_size as u64 * MULTI_PASS_FACTOR as u64
}

/// Plan the resize passes for a thumbnail.
///
/// Small and moderate sources resize straight to the box. Oversized sources
/// first resize to twice the box (aspect-preserved) and then to the box, which
/// avoids the aliasing of a single large-ratio resample.
pub fn plan_thumbnail(source: (u32, u32), box_size: u32) -> ThumbnailPlan {
    let target: ResizeParams = fit_within_box(source, box_size).into();

    let passes = if needs_multi_pass(source, box_size) {
        let intermediate = fit_within_box(source, box_size * INTERMEDIATE_FACTOR);
        vec![intermediate.into(), target]
    } else {
        vec![target]
    };

    ThumbnailPlan { passes }
}

/// Plan the preview raster.
///
/// The longer edge is bounded by `max_size`. Sources that already fit keep
/// their exact dimensions.
pub fn plan_preview(source: (u32, u32), max_size: u32) -> PreviewPlan {
    let (src_w, src_h) = source;

    if src_w.max(src_h) <= max_size {
        return PreviewPlan {
            resize: None,
            width: src_w,
            height: src_h,
        };
    }

    let (width, height) = fit_within_box(source, max_size);
    PreviewPlan {
        resize: Some(ResizeParams { width, height }),
        width,
        height,
    }
}
