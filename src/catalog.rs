//! Descriptor lists: loading, validation, and the catalog view.
//!
//! The catalog view narrows and orders a descriptor list before it is handed
//! to a gallery: a case-insensitive search over names and URLs, six sort
//! orders, and either page-by-page or infinite-scroll pagination (pages are
//! 0-based).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::types::ImageDescriptor;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid descriptor list {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown sort order: {0} (expected name, name-desc, size, size-desc, dimensions, dimensions-desc)")]
    UnknownSort(String),
}

// ============================================================================
// Descriptor list files
// ============================================================================

/// Read a JSON array of descriptors. Duplicate ids are logged, not rejected.
pub fn load_descriptors(path: &Path) -> Result<Vec<ImageDescriptor>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptors: Vec<ImageDescriptor> =
        serde_json::from_str(&content).map_err(|source| CatalogError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    for id in duplicate_ids(&descriptors) {
        warn!(id = %id, "duplicate image id; later entries share its cache slot");
    }
    Ok(descriptors)
}

/// Write descriptors as pretty JSON.
pub fn save_descriptors(path: &Path, descriptors: &[ImageDescriptor]) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(descriptors).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CatalogError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Ids that appear more than once, in first-seen order.
pub fn duplicate_ids(descriptors: &[ImageDescriptor]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut dups = Vec::new();
    for d in descriptors {
        let count = counts.entry(d.id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            dups.push(d.id.clone());
        }
    }
    dups
}

/// A problem found by [`check_descriptors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    DuplicateId(String),
    EmptyId { index: usize },
    EmptyUrl { id: String },
    EmptyName { id: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateId(id) => write!(f, "duplicate id '{id}'"),
            Issue::EmptyId { index } => write!(f, "entry {} has an empty id", index + 1),
            Issue::EmptyUrl { id } => write!(f, "'{id}' has an empty source URL"),
            Issue::EmptyName { id } => write!(f, "'{id}' has an empty display name"),
        }
    }
}

/// Validate a descriptor list.
pub fn check_descriptors(descriptors: &[ImageDescriptor]) -> Vec<Issue> {
    let mut issues: Vec<Issue> = duplicate_ids(descriptors)
        .into_iter()
        .map(Issue::DuplicateId)
        .collect();
    for (index, d) in descriptors.iter().enumerate() {
        if d.id.trim().is_empty() {
            issues.push(Issue::EmptyId { index });
            continue;
        }
        if d.source_url.trim().is_empty() {
            issues.push(Issue::EmptyUrl { id: d.id.clone() });
        }
        if d.display_name.trim().is_empty() {
            issues.push(Issue::EmptyName { id: d.id.clone() });
        }
    }
    issues
}

// ============================================================================
// Filter and sort
// ============================================================================

/// Keep descriptors whose name or URL contains `query`, ignoring case.
/// A blank query keeps everything.
pub fn filter<'a>(descriptors: &'a [ImageDescriptor], query: &str) -> Vec<&'a ImageDescriptor> {
    let query = query.trim().to_lowercase();
    descriptors
        .iter()
        .filter(|d| {
            query.is_empty()
                || d.display_name.to_lowercase().contains(&query)
                || d.source_url.to_lowercase().contains(&query)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Name,
    NameDesc,
    Size,
    SizeDesc,
    Dimensions,
    DimensionsDesc,
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortOrder::Name),
            "name-desc" => Ok(SortOrder::NameDesc),
            "size" => Ok(SortOrder::Size),
            "size-desc" => Ok(SortOrder::SizeDesc),
            "dimensions" => Ok(SortOrder::Dimensions),
            "dimensions-desc" => Ok(SortOrder::DimensionsDesc),
            other => Err(CatalogError::UnknownSort(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::Name => "name",
            SortOrder::NameDesc => "name-desc",
            SortOrder::Size => "size",
            SortOrder::SizeDesc => "size-desc",
            SortOrder::Dimensions => "dimensions",
            SortOrder::DimensionsDesc => "dimensions-desc",
        };
        f.write_str(name)
    }
}

fn compare_names(a: &ImageDescriptor, b: &ImageDescriptor) -> Ordering {
    a.display_name
        .to_lowercase()
        .cmp(&b.display_name.to_lowercase())
        .then_with(|| a.display_name.cmp(&b.display_name))
}

/// Stable sort in place. Missing sizes and dimensions count as 0.
pub fn sort(descriptors: &mut [&ImageDescriptor], order: SortOrder) {
    let size = |d: &ImageDescriptor| d.known_size.unwrap_or(0);
    match order {
        SortOrder::Name => descriptors.sort_by(|a, b| compare_names(a, b)),
        SortOrder::NameDesc => descriptors.sort_by(|a, b| compare_names(b, a)),
        SortOrder::Size => descriptors.sort_by_key(|d| size(d)),
        SortOrder::SizeDesc => descriptors.sort_by(|a, b| size(b).cmp(&size(a))),
        SortOrder::Dimensions => descriptors.sort_by_key(|d| d.hinted_area()),
        SortOrder::DimensionsDesc => {
            descriptors.sort_by(|a, b| b.hinted_area().cmp(&a.hinted_area()))
        }
    }
}

// ============================================================================
// Pagination
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageMode {
    /// Only the requested page.
    #[default]
    Paged,
    /// Everything up to and including the requested page.
    Infinite,
}

/// One page of a filtered, sorted list.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage<'a> {
    pub items: Vec<&'a ImageDescriptor>,
    pub page: usize,
    pub total_pages: usize,
    /// Matches before pagination.
    pub total: usize,
}

impl CatalogPage<'_> {
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

pub fn total_pages(len: usize, per_page: usize) -> usize {
    len.div_ceil(per_page.max(1))
}

/// Slice `items` for `page` (0-based).
pub fn paginate<'a>(
    items: &[&'a ImageDescriptor],
    page: usize,
    per_page: usize,
    mode: PageMode,
) -> CatalogPage<'a> {
    let per_page = per_page.max(1);
    let end = page.saturating_add(1).saturating_mul(per_page).min(items.len());
    let start = match mode {
        PageMode::Paged => page.saturating_mul(per_page).min(end),
        PageMode::Infinite => 0,
    };
    CatalogPage {
        items: items[start..end].to_vec(),
        page,
        total_pages: total_pages(items.len(), per_page),
        total: items.len(),
    }
}

/// Filter, sort and paginate in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub sort: SortOrder,
    pub page: usize,
    pub per_page: usize,
    pub mode: PageMode,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: SortOrder::Name,
            page: 0,
            per_page: 20,
            mode: PageMode::Paged,
        }
    }
}

impl CatalogQuery {
    pub fn apply<'a>(&self, descriptors: &'a [ImageDescriptor]) -> CatalogPage<'a> {
        let mut matches = filter(descriptors, &self.search);
        sort(&mut matches, self.sort);
        paginate(&matches, self.page, self.per_page, self.mode)
    }
}

// ============================================================================
// Sizes
// ============================================================================

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exp])
}
