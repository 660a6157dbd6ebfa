//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Resize** | Lanczos3 via `resize_exact` |
//! | **Encode** | JPEG (`JpegEncoder`, per-variant quality) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{fit_within_box, needs_multi_pass, plan_preview, plan_thumbnail};
pub use operations::{PreviewConfig, RenderedPair, ThumbnailConfig, render_variants};
pub use params::{PreviewPlan, Quality, ResizeParams, ThumbnailPlan};
pub use rust_backend::{OUTPUT_EXTENSION, OUTPUT_MIME, RustBackend, supported_input_extensions};
