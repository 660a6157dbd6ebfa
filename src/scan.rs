//! Directory scanning into descriptor lists.
//!
//! Walks a directory tree and turns every supported image into an
//! [`ImageDescriptor`]:
//!
//! ```text
//! catalog/                      id                 display_name
//! ├── 001-Oak-Panel.jpg     →   001-oak-panel      "Oak Panel"
//! ├── flooring/
//! │   └── ash_board.png     →   flooring-ash-board "ash board"
//! └── .drafts/              →   (hidden, skipped)
//! ```
//!
//! Entries are ordered by path. `source_url` is the path relative to the
//! scanned root with `/` separators, so the list can be fed straight back
//! through a [`FileSource`](crate::source::FileSource) rooted at the same
//! directory. File sizes and pixel dimensions (read from the image header
//! only) are recorded as hints for the catalog's sort orders.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::imaging::supported_input_extensions;
use crate::naming::{display_name, slugify};
use crate::types::ImageDescriptor;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            let ext = e.to_ascii_lowercase();
            supported_input_extensions().contains(&ext.as_str())
        })
}

/// Relative path with `/` separators.
fn url_for(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Give `base` a numeric suffix until it is unused.
fn unique_id(base: String, taken: &mut HashSet<String>) -> String {
    let base = if base.is_empty() { "image".to_string() } else { base };
    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    candidate
}

/// Scan `root` for images.
pub fn scan(root: &Path) -> Result<Vec<ImageDescriptor>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut taken = HashSet::new();
    let mut descriptors = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_supported(entry.path()) {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let without_ext = relative.with_extension("");

        let mut descriptor = ImageDescriptor::new(
            unique_id(slugify(&url_for(&without_ext)), &mut taken),
            url_for(relative),
            display_name(&stem),
        );
        descriptor.known_size = entry.metadata().ok().map(|m| m.len());
        if let Ok((w, h)) = image::image_dimensions(entry.path()) {
            descriptor.width = Some(w);
            descriptor.height = Some(h);
        }
        debug!(id = %descriptor.id, url = %descriptor.source_url, "found image");
        descriptors.push(descriptor);
    }

    Ok(descriptors)
}
