//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnails]
//! size = 250                # Square box (px) the thumbnail is fitted into
//! quality = 90              # JPEG quality (1-100)
//!
//! [previews]
//! size = 2000               # Upper bound on the preview's longer edge (px)
//! quality = 95              # JPEG quality (1-100)
//!
//! [cache]
//! max_entries = 100         # Processed images kept in memory
//!
//! [loading]
//! lazy = true               # Only process slots near the viewport
//! lookahead_margin = 50.0   # Extra px around the viewport counted as visible
//! threshold = 0.1           # Visible fraction of a slot needed to trigger work
//! batch_size = 3            # Images processed concurrently per group
//! frame_interval_ms = 16    # Pause between groups (0 = just yield)
//!
//! [catalog]
//! per_page = 20             # Descriptors per catalog page
//!
//! [source]
//! timeout_secs = 30         # HTTP fetch timeout
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{PreviewConfig, Quality, ThumbnailConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Grid thumbnail settings.
    pub thumbnails: ThumbnailsConfig,
    /// Lightbox preview settings.
    pub previews: PreviewsConfig,
    /// Processed-image cache settings.
    pub cache: CacheConfig,
    /// Visibility tracking and batch scheduling.
    pub loading: LoadingConfig,
    /// Catalog listing settings.
    pub catalog: CatalogConfig,
    /// Original-image fetching.
    pub source: SourceConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.thumbnails.size == 0 {
            return invalid("thumbnails.size must be greater than 0");
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return invalid("thumbnails.quality must be 1-100");
        }
        if self.previews.size == 0 {
            return invalid("previews.size must be greater than 0");
        }
        if !(1..=100).contains(&self.previews.quality) {
            return invalid("previews.quality must be 1-100");
        }
        if self.cache.max_entries == 0 {
            return invalid("cache.max_entries must be at least 1");
        }
        if self.loading.batch_size == 0 {
            return invalid("loading.batch_size must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.loading.threshold) {
            return invalid("loading.threshold must be between 0 and 1");
        }
        if !(self.loading.lookahead_margin >= 0.0) {
            return invalid("loading.lookahead_margin must not be negative");
        }
        if self.catalog.per_page == 0 {
            return invalid("catalog.per_page must be at least 1");
        }
        Ok(())
    }

    /// Settings for processing `images` descriptors eagerly in one run.
    ///
    /// Lazy loading is off and the cache holds at least every image, so
    /// nothing processed is evicted before it is written out.
    pub fn for_batch(&self, images: usize) -> GalleryConfig {
        let mut config = self.clone();
        config.loading.lazy = false;
        config.cache.max_entries = config.cache.max_entries.max(images);
        config
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            size: self.thumbnails.size,
            quality: Quality::new(self.thumbnails.quality),
        }
    }

    pub fn preview_config(&self) -> PreviewConfig {
        PreviewConfig {
            size: self.previews.size,
            quality: Quality::new(self.previews.quality),
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Edge of the square box (px) the thumbnail is fitted into.
    pub size: u32,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            size: 250,
            quality: 90,
        }
    }
}

/// Preview generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewsConfig {
    /// Bound on the longer edge; smaller originals are never upscaled.
    pub size: u32,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for PreviewsConfig {
    fn default() -> Self {
        Self {
            size: 2000,
            quality: 95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: crate::cache::DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Lazy loading and batch scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadingConfig {
    /// When false, every image is processed as soon as the gallery mounts.
    pub lazy: bool,
    /// Pixels added on every side of the viewport before testing intersection.
    pub lookahead_margin: f64,
    /// Fraction of a slot's area that must intersect to count as visible.
    pub threshold: f64,
    /// Images processed concurrently per group.
    pub batch_size: usize,
    /// Pause between groups in milliseconds. 0 yields the thread instead.
    pub frame_interval_ms: u64,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            lazy: true,
            lookahead_margin: 50.0,
            threshold: 0.1,
            batch_size: 3,
            frame_interval_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    pub per_page: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { per_page: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Timeout for HTTP fetches, in seconds.
    pub timeout_secs: u64,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the stock defaults. Unknown keys and out-of-range
/// values are errors.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Adaptive Gallery Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Grid thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Edge of the square box (px) each thumbnail is fitted into. The longer
# side of the image maps to this size; the shorter side scales with it.
size = 250

# JPEG quality (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Lightbox previews
# ---------------------------------------------------------------------------
[previews]
# Upper bound on the preview's longer edge. Smaller originals keep their size.
size = 2000

# JPEG quality (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Processed image cache
# ---------------------------------------------------------------------------
[cache]
# Maximum processed images held in memory. When full, the earliest
# inserted image is dropped (reading an image does not protect it).
max_entries = 100

# ---------------------------------------------------------------------------
# Lazy loading and batching
# ---------------------------------------------------------------------------
[loading]
# Only process images whose slots are near the viewport.
lazy = true

# Extra pixels around the viewport that count as visible.
lookahead_margin = 50.0

# Fraction of a slot that must be inside the viewport to trigger processing.
threshold = 0.1

# Images processed concurrently per group.
batch_size = 3

# Pause between groups in milliseconds (0 = just yield).
frame_interval_ms = 16

# ---------------------------------------------------------------------------
# Catalog listing
# ---------------------------------------------------------------------------
[catalog]
per_page = 20

# ---------------------------------------------------------------------------
# Original image fetching
# ---------------------------------------------------------------------------
[source]
# HTTP fetch timeout in seconds.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
