//! Plans for deriving the thumbnail and preview rasters.
//!
//! The planning functions in `calculations` produce these values and the
//! backend executes them, so dimension math stays testable against a
//! recording mock.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1-100, default 90). Clamped on construction.
//! - [`ResizeParams`]: Target dimensions for one resampling pass.
//! - [`ThumbnailPlan`]: The ordered resize passes that produce a thumbnail.
//! - [`PreviewPlan`]: Final preview dimensions, or none when the original is kept.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// One resampling pass to exact dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for ResizeParams {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Resize passes for a thumbnail, applied in order.
///
/// Oversized sources get an intermediate pass before the final one; the last
/// element is always the final thumbnail size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailPlan {
    pub passes: Vec<ResizeParams>,
}

impl ThumbnailPlan {
    /// Final thumbnail dimensions.
    pub fn target(&self) -> ResizeParams {
        // plan_thumbnail always emits at least one pass
        self.passes[self.passes.len() - 1]
    }

    pub fn is_multi_pass(&self) -> bool {
        self.passes.len() > 1
    }
}

/// Preview sizing. `resize` is `None` when the source already fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewPlan {
    pub resize: Option<ResizeParams>,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn thumbnail_plan_target_is_last_pass() {
        let plan = ThumbnailPlan {
            passes: vec![(500, 375).into(), (250, 188).into()],
        };
        assert!(plan.is_multi_pass());
        assert_eq!(plan.target(), ResizeParams { width: 250, height: 188 });
    }
}
