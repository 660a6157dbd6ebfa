//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every image is shown by its 1-based position and display name first. The
//! source URL and derived sizes follow as indented context lines, so the
//! output reads as an inventory of the gallery rather than a file listing.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Images (2)
//! 001 Oak Panel
//!     Source: 001-Oak-Panel.jpg
//!     1200×800, 51.08 KB
//! 002 ash board
//!     Source: flooring/ash_board.png
//! ```
//!
//! ## Process
//!
//! ```text
//! Loading 4 images in 2 groups
//! 001 Oak Panel (processed)
//!     Original: 4000×3000, 1.5 MB
//!     Thumbnail: 250×188
//!     Preview: 2000×1500
//! 003 Walnut Slab (failed)
//!     Error: Fetch failed: IO error reading …
//! Done: 3 processed, 1 failed
//! ```
//!
//! ## List
//!
//! ```text
//! Page 1 of 3 (45 matches, sorted by name)
//! 001 ash board
//!     Source: flooring/ash_board.png
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and, where the CLI needs it, a `print_*` wrapper that writes to
//! stdout. Format functions are pure: no I/O, no side effects.

use crate::catalog::{CatalogPage, Issue, PageMode, SortOrder, format_file_size};
use crate::gallery::{BatchSummary, GalleryEvent, LoadStatus};
use crate::render::RenderSummary;
use crate::types::ImageDescriptor;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001 Oak Panel`, or `001 (oak)` when the display name is blank.
fn image_line(index: usize, name: &str, id: &str) -> String {
    if name.trim().is_empty() {
        format!("{} ({})", format_index(index), id)
    } else {
        format!("{} {}", format_index(index), name)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Descriptor entry with its source and hints.
fn descriptor_lines(index: usize, d: &ImageDescriptor) -> Vec<String> {
    let mut lines = vec![image_line(index, &d.display_name, &d.id)];
    lines.push(format!("{}Source: {}", indent(1), d.source_url));

    let mut hints = Vec::new();
    if let (Some(w), Some(h)) = (d.width, d.height) {
        hints.push(format!("{w}×{h}"));
    }
    if let Some(size) = d.known_size {
        hints.push(format_file_size(size));
    }
    if !hints.is_empty() {
        lines.push(format!("{}{}", indent(1), hints.join(", ")));
    }
    lines
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(descriptors: &[ImageDescriptor]) -> Vec<String> {
    let mut lines = vec![format!("Images ({})", descriptors.len())];
    for (i, d) in descriptors.iter().enumerate() {
        lines.extend(descriptor_lines(i + 1, d));
    }
    lines
}

pub fn print_scan_output(descriptors: &[ImageDescriptor]) {
    for line in format_scan_output(descriptors) {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

/// Summary line for a finished batch. Zero counts are left out.
pub fn format_batch_summary(summary: &BatchSummary) -> String {
    let mut parts = Vec::new();
    if summary.processed > 0 {
        parts.push(format!("{} processed", summary.processed));
    }
    if summary.cached > 0 {
        parts.push(format!("{} cached", summary.cached));
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed));
    }
    if summary.skipped > 0 {
        parts.push(format!("{} already loading", summary.skipped));
    }
    if summary.groups_discarded > 0 {
        parts.push(format!("{} discarded", plural(summary.groups_discarded, "group")));
    }
    if parts.is_empty() {
        "Done: nothing to do".to_string()
    } else {
        format!("Done: {}", parts.join(", "))
    }
}

/// Lines for one progress event from a running gallery.
pub fn format_gallery_event(event: &GalleryEvent) -> Vec<String> {
    match event {
        GalleryEvent::BatchStarted { images, groups } => {
            vec![format!(
                "Loading {} in {}",
                plural(*images, "image"),
                plural(*groups, "group")
            )]
        }
        GalleryEvent::ImageReady {
            index,
            id,
            display_name,
            status,
            metadata,
            thumbnail,
            preview,
        } => {
            let status = match status {
                LoadStatus::Cached => "cached",
                LoadStatus::Processed => "processed",
            };
            vec![
                format!("{} ({})", image_line(index + 1, display_name, id), status),
                format!(
                    "{}Original: {}×{}, {}",
                    indent(1),
                    metadata.width,
                    metadata.height,
                    format_file_size(metadata.byte_size)
                ),
                format!("{}Thumbnail: {}×{}", indent(1), thumbnail.0, thumbnail.1),
                format!("{}Preview: {}×{}", indent(1), preview.0, preview.1),
            ]
        }
        GalleryEvent::ImageFailed {
            index,
            id,
            display_name,
            reason,
        } => vec![
            format!("{} (failed)", image_line(index + 1, display_name, id)),
            format!("{}Error: {}", indent(1), reason),
        ],
        GalleryEvent::BatchFinished(summary) => vec![format_batch_summary(summary)],
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(descriptors: &[ImageDescriptor], issues: &[Issue]) -> Vec<String> {
    let mut lines = vec![format!("Checked {}", plural(descriptors.len(), "descriptor"))];
    if issues.is_empty() {
        lines.push(format!("{}No problems found", indent(1)));
    } else {
        for issue in issues {
            lines.push(format!("{}✗ {}", indent(1), issue));
        }
    }
    lines
}

pub fn print_check_output(descriptors: &[ImageDescriptor], issues: &[Issue]) {
    for line in format_check_output(descriptors, issues) {
        println!("{}", line);
    }
}

// ============================================================================
// List
// ============================================================================

/// One catalog page. Positions count from the start of the filtered list.
pub fn format_catalog_page(
    page: &CatalogPage<'_>,
    sort: SortOrder,
    mode: PageMode,
    per_page: usize,
) -> Vec<String> {
    if page.total == 0 {
        return vec!["No matches".to_string()];
    }
    let matches = if page.total == 1 { "match" } else { "matches" };
    let mut lines = vec![format!(
        "Page {} of {} ({} {}, sorted by {})",
        page.page + 1,
        page.total_pages,
        page.total,
        matches,
        sort
    )];
    let offset = match mode {
        PageMode::Paged => page.page * per_page.max(1),
        PageMode::Infinite => 0,
    };
    for (i, d) in page.items.iter().enumerate() {
        lines.extend(descriptor_lines(offset + i + 1, d));
    }
    lines
}

// ============================================================================
// Build
// ============================================================================

pub fn format_render_output(summary: &RenderSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Rendered {}, {} → {}",
        plural(summary.rendered.len(), "image"),
        plural(summary.placeholders.len(), "placeholder"),
        summary.index_path.display()
    )];
    if summary.originals_copied > 0 {
        lines.push(format!(
            "{}Copied {} for download",
            indent(1),
            plural(summary.originals_copied, "original")
        ));
    }
    for id in &summary.placeholders {
        lines.push(format!("{}Placeholder: {}", indent(1), id));
    }
    lines
}

pub fn print_render_output(summary: &RenderSummary) {
    for line in format_render_output(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::paginate;
    use crate::types::ImageMetadata;
    use std::path::PathBuf;

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn image_line_falls_back_to_id() {
        assert_eq!(image_line(3, "Oak Panel", "oak"), "003 Oak Panel");
        assert_eq!(image_line(3, " ", "oak"), "003 (oak)");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "image"), "1 image");
        assert_eq!(plural(0, "image"), "0 images");
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_output_lists_sources_and_hints() {
        let mut oak = ImageDescriptor::new("oak", "001-Oak-Panel.jpg", "Oak Panel");
        oak.width = Some(1200);
        oak.height = Some(800);
        oak.known_size = Some(52_311);
        let ash = ImageDescriptor::new("ash", "flooring/ash_board.png", "ash board");

        let lines = format_scan_output(&[oak, ash]);
        assert_eq!(
            lines,
            vec![
                "Images (2)",
                "001 Oak Panel",
                "    Source: 001-Oak-Panel.jpg",
                "    1200×800, 51.08 KB",
                "002 ash board",
                "    Source: flooring/ash_board.png",
            ]
        );
    }

    // =========================================================================
    // Process events
    // =========================================================================

    #[test]
    fn batch_started_line() {
        let lines = format_gallery_event(&GalleryEvent::BatchStarted { images: 7, groups: 3 });
        assert_eq!(lines, vec!["Loading 7 images in 3 groups"]);
        let lines = format_gallery_event(&GalleryEvent::BatchStarted { images: 1, groups: 1 });
        assert_eq!(lines, vec!["Loading 1 image in 1 group"]);
    }

    #[test]
    fn image_ready_lines() {
        let event = GalleryEvent::ImageReady {
            index: 0,
            id: "oak".into(),
            display_name: "Oak Panel".into(),
            status: LoadStatus::Processed,
            metadata: ImageMetadata {
                width: 4000,
                height: 3000,
                byte_size: 1_572_864,
            },
            thumbnail: (250, 188),
            preview: (2000, 1500),
        };
        assert_eq!(
            format_gallery_event(&event),
            vec![
                "001 Oak Panel (processed)",
                "    Original: 4000×3000, 1.5 MB",
                "    Thumbnail: 250×188",
                "    Preview: 2000×1500",
            ]
        );
    }

    #[test]
    fn image_failed_lines() {
        let event = GalleryEvent::ImageFailed {
            index: 2,
            id: "walnut".into(),
            display_name: "Walnut Slab".into(),
            reason: "Decode failed: bad header".into(),
        };
        assert_eq!(
            format_gallery_event(&event),
            vec!["003 Walnut Slab (failed)", "    Error: Decode failed: bad header"]
        );
    }

    #[test]
    fn batch_summary_skips_zero_counts() {
        let summary = BatchSummary {
            processed: 3,
            failed: 1,
            ..BatchSummary::default()
        };
        assert_eq!(format_batch_summary(&summary), "Done: 3 processed, 1 failed");

        let summary = BatchSummary {
            cached: 2,
            skipped: 1,
            groups_discarded: 1,
            ..BatchSummary::default()
        };
        assert_eq!(
            format_batch_summary(&summary),
            "Done: 2 cached, 1 already loading, 1 group discarded"
        );
        assert_eq!(format_batch_summary(&BatchSummary::default()), "Done: nothing to do");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_clean() {
        let list = vec![ImageDescriptor::new("a", "a.jpg", "A")];
        assert_eq!(
            format_check_output(&list, &[]),
            vec!["Checked 1 descriptor", "    No problems found"]
        );
    }

    #[test]
    fn check_output_lists_issues() {
        let list = vec![
            ImageDescriptor::new("a", "a.jpg", "A"),
            ImageDescriptor::new("a", "b.jpg", "B"),
        ];
        let lines = format_check_output(&list, &[Issue::DuplicateId("a".into())]);
        assert_eq!(lines, vec!["Checked 2 descriptors", "    ✗ duplicate id 'a'"]);
    }

    // =========================================================================
    // List
    // =========================================================================

    fn many(n: usize) -> Vec<ImageDescriptor> {
        (0..n)
            .map(|i| ImageDescriptor::new(format!("i{i}"), format!("i{i}.jpg"), format!("Item {i:02}")))
            .collect()
    }

    #[test]
    fn catalog_page_numbers_continue_across_pages() {
        let list = many(5);
        let items: Vec<_> = list.iter().collect();
        let page = paginate(&items, 1, 2, PageMode::Paged);
        let lines = format_catalog_page(&page, SortOrder::Name, PageMode::Paged, 2);
        assert_eq!(lines[0], "Page 2 of 3 (5 matches, sorted by name)");
        assert_eq!(lines[1], "003 Item 02");
        assert_eq!(lines[3], "004 Item 03");
    }

    #[test]
    fn catalog_infinite_page_starts_at_one() {
        let list = many(5);
        let items: Vec<_> = list.iter().collect();
        let page = paginate(&items, 1, 2, PageMode::Infinite);
        let lines = format_catalog_page(&page, SortOrder::Name, PageMode::Infinite, 2);
        assert_eq!(lines[1], "001 Item 00");
        assert_eq!(lines.len(), 1 + 4 * 2);
    }

    #[test]
    fn catalog_single_match() {
        let list = many(1);
        let items: Vec<_> = list.iter().collect();
        let page = paginate(&items, 0, 20, PageMode::Paged);
        let lines = format_catalog_page(&page, SortOrder::SizeDesc, PageMode::Paged, 20);
        assert_eq!(lines[0], "Page 1 of 1 (1 match, sorted by size-desc)");
    }

    #[test]
    fn catalog_no_matches() {
        let page = paginate(&[], 0, 20, PageMode::Paged);
        assert_eq!(format_catalog_page(&page, SortOrder::Name, PageMode::Paged, 20), vec!["No matches"]);
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn render_output_lines() {
        let summary = RenderSummary {
            index_path: PathBuf::from("dist/index.html"),
            rendered: vec!["oak".into(), "ash".into()],
            placeholders: vec!["bad".into()],
            originals_copied: 3,
        };
        assert_eq!(
            format_render_output(&summary),
            vec![
                "Rendered 2 images, 1 placeholder → dist/index.html",
                "    Copied 3 originals for download",
                "    Placeholder: bad",
            ]
        );
    }
}
