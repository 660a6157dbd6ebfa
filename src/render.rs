//! Static gallery page rendering.
//!
//! Writes what a gallery has processed so far as a self-contained page:
//!
//! ```text
//! dist/
//! ├── index.html                    # grid + one <dialog> lightbox per image
//! ├── images/
//! │   ├── 001-oak-thumb.jpg         # cached thumbnail
//! │   └── 001-oak-preview.jpg       # cached preview
//! └── originals/
//!     └── 001-oak-Oak Panel.jpg     # download target for local sources
//! ```
//!
//! Images that are not in the cache render as placeholder slots. HTTP(S)
//! sources are linked directly for download; other sources are fetched again
//! through the gallery and copied into `originals/`, prefixed with the slot
//! slug so equal display names never collide. The link's `download` attribute
//! still carries the plain display name.
//!
//! CSS and the lightbox script are embedded at compile time.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::catalog::format_file_size;
use crate::gallery::{Gallery, download_filename};
use crate::imaging::{ImageBackend, OUTPUT_EXTENSION};
use crate::naming::slugify;
use crate::source::{ImageSource, url_scheme};
use crate::types::{ImageDescriptor, ProcessedImage};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const CSS: &str = include_str!("../static/gallery.css");
const JS: &str = include_str!("../static/lightbox.js");

/// One slot on the page.
#[derive(Debug, Clone)]
pub struct GalleryEntry<'a> {
    pub descriptor: &'a ImageDescriptor,
    pub image: Option<Arc<ProcessedImage>>,
    /// Where the download link points.
    pub original_href: String,
}

impl GalleryEntry<'_> {
    fn slug(&self, index: usize) -> String {
        image_slug(index, &self.descriptor.id)
    }
}

/// What [`render_gallery`] wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub index_path: PathBuf,
    /// Ids whose thumbnail and preview were written.
    pub rendered: Vec<String>,
    /// Ids shown as placeholders.
    pub placeholders: Vec<String>,
    pub originals_copied: usize,
}

/// `001-oak-panel`: 1-based position plus the slugged id.
pub fn image_slug(index: usize, id: &str) -> String {
    let slug = slugify(id);
    if slug.is_empty() {
        format!("{:03}", index + 1)
    } else {
        format!("{:03}-{}", index + 1, slug)
    }
}

/// File name of a copied original: unique per slot, display name kept readable.
pub fn original_file_name(slug: &str, descriptor: &ImageDescriptor) -> String {
    format!("{slug}-{}", download_filename(descriptor))
}

pub fn thumbnail_href(slug: &str) -> String {
    format!("images/{slug}-thumb.{OUTPUT_EXTENSION}")
}

pub fn preview_href(slug: &str) -> String {
    format!("images/{slug}-preview.{OUTPUT_EXTENSION}")
}

/// Escape the characters that break a relative href.
fn href_escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            _ => out.push(c),
        }
    }
    out
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    fs::write(path, bytes).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn create_dir(path: &Path) -> Result<(), RenderError> {
    fs::create_dir_all(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the page and every cached raster into `output_dir`.
pub fn render_gallery<B: ImageBackend, S: ImageSource>(
    gallery: &Gallery<B, S>,
    output_dir: &Path,
    title: &str,
) -> Result<RenderSummary, RenderError> {
    let images_dir = output_dir.join("images");
    let originals_dir = output_dir.join("originals");
    create_dir(&images_dir)?;

    let mut summary = RenderSummary::default();
    let mut entries = Vec::with_capacity(gallery.descriptors().len());

    for (index, descriptor) in gallery.descriptors().iter().enumerate() {
        let image = gallery.cached(&descriptor.id);
        let slug = image_slug(index, &descriptor.id);

        match &image {
            Some(image) => {
                write_file(&output_dir.join(thumbnail_href(&slug)), &image.thumbnail.data)?;
                write_file(&output_dir.join(preview_href(&slug)), &image.preview.data)?;
                summary.rendered.push(descriptor.id.clone());
            }
            None => summary.placeholders.push(descriptor.id.clone()),
        }

        let original_href = match url_scheme(&descriptor.source_url).as_deref() {
            Some("http") | Some("https") => descriptor.source_url.clone(),
            _ => match gallery.download_as(
                &descriptor.id,
                &originals_dir,
                &original_file_name(&slug, descriptor),
            ) {
                Ok(path) => {
                    summary.originals_copied += 1;
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| download_filename(descriptor));
                    href_escape(&format!("originals/{name}"))
                }
                Err(e) => {
                    warn!(id = %descriptor.id, error = %e, "could not copy original");
                    descriptor.source_url.clone()
                }
            },
        };

        entries.push(GalleryEntry {
            descriptor,
            image,
            original_href,
        });
    }

    let index_path = output_dir.join("index.html");
    let page = render_page(title, &entries);
    write_file(&index_path, page.into_string().as_bytes())?;
    summary.index_path = index_path;
    Ok(summary)
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                (content)
                script { (PreEscaped(JS)) }
            }
        }
    }
}

fn image_details(entry: &GalleryEntry<'_>) -> String {
    let mut parts = vec![entry.descriptor.display_name.clone()];
    if let Some(image) = &entry.image {
        parts.push(format!("{}×{}", image.metadata.width, image.metadata.height));
        parts.push(format_file_size(image.metadata.byte_size));
    } else if let Some(size) = entry.descriptor.known_size {
        parts.push(format_file_size(size));
    }
    parts.join(" · ")
}

fn render_slot(index: usize, entry: &GalleryEntry<'_>) -> Markup {
    let d = entry.descriptor;
    html! {
        @if let Some(image) = &entry.image {
            div.slot data-image-id=(d.id) data-index=(index) {
                a href=(format!("#lightbox-{index}")) data-open=(index) {
                    img src=(thumbnail_href(&entry.slug(index)))
                        alt=(d.display_name)
                        width=(image.thumbnail.width)
                        height=(image.thumbnail.height)
                        loading="lazy";
                }
                span.caption { (image_details(entry)) }
            }
        } @else {
            div.slot.placeholder data-image-id=(d.id) data-index=(index) {
                (d.display_name)
            }
        }
    }
}

fn render_lightbox(index: usize, total: usize, entry: &GalleryEntry<'_>) -> Markup {
    let d = entry.descriptor;
    let prev = (index + total - 1) % total;
    let next = (index + 1) % total;
    html! {
        dialog.lightbox id=(format!("lightbox-{index}")) data-image-id=(d.id) {
            div.lightbox-frame {
                @if let Some(image) = &entry.image {
                    img src=(preview_href(&entry.slug(index)))
                        alt=(d.display_name)
                        width=(image.preview.width)
                        height=(image.preview.height);
                } @else {
                    p { "Preview not available" }
                }
                div.lightbox-meta { (image_details(entry)) }
                nav.lightbox-nav {
                    a.prev href=(format!("#lightbox-{prev}")) data-step="-1" { "‹ Previous" }
                    a.download href=(entry.original_href) download=(download_filename(d)) { "Download" }
                    form method="dialog" {
                        button { "Close" }
                    }
                    a.next href=(format!("#lightbox-{next}")) data-step="1" { "Next ›" }
                }
            }
        }
    }
}

/// The whole page: header, grid, lightboxes.
pub fn render_page(title: &str, entries: &[GalleryEntry<'_>]) -> Markup {
    let ready = entries.iter().filter(|e| e.image.is_some()).count();
    let content = html! {
        header.gallery-header {
            h1 { (title) }
            p { (entries.len()) " images, " (ready) " processed" }
        }
        main.gallery-grid {
            @for (i, entry) in entries.iter().enumerate() {
                (render_slot(i, entry))
            }
        }
        @for (i, entry) in entries.iter().enumerate() {
            (render_lightbox(i, entries.len(), entry))
        }
    };
    base_document(title, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::imaging::backend::tests::MockBackend;
    use crate::source::tests::MockSource;
    use crate::test_helpers::{TempDir, descriptors};
    use crate::types::{EncodedRaster, ImageMetadata};

    fn processed(w: u32, h: u32, bytes: u64) -> Arc<ProcessedImage> {
        let raster = |w, h| EncodedRaster {
            width: w,
            height: h,
            data: vec![0xFF, 0xD8],
        };
        Arc::new(ProcessedImage {
            thumbnail: raster(250, 188),
            preview: raster(w.min(2000), h.min(1500)),
            metadata: ImageMetadata {
                width: w,
                height: h,
                byte_size: bytes,
            },
        })
    }

    fn entries<'a>(list: &'a [ImageDescriptor], ready: &[bool]) -> Vec<GalleryEntry<'a>> {
        list.iter()
            .zip(ready)
            .map(|(d, &r)| GalleryEntry {
                descriptor: d,
                image: r.then(|| processed(4000, 3000, 1536)),
                original_href: d.source_url.clone(),
            })
            .collect()
    }

    #[test]
    fn slug_and_hrefs() {
        assert_eq!(image_slug(0, "Oak Panel"), "001-oak-panel");
        assert_eq!(image_slug(11, "!!!"), "012");
        assert_eq!(thumbnail_href("001-oak"), "images/001-oak-thumb.jpg");
        assert_eq!(preview_href("001-oak"), "images/001-oak-preview.jpg");
        assert_eq!(href_escape("originals/Oak Panel#1.jpg"), "originals/Oak%20Panel%231.jpg");
    }

    #[test]
    fn base_document_includes_doctype_and_script() {
        let doc = base_document("Test", html! { p { "x" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Test</title>"));
        assert!(doc.contains("showModal"));
    }

    #[test]
    fn grid_has_one_slot_per_descriptor() {
        let list = descriptors(&[("oak", "oak.jpg"), ("ash", "ash.jpg"), ("elm", "elm.jpg")]);
        let html = render_page("Woods", &entries(&list, &[true, false, true])).into_string();

        assert_eq!(html.matches("class=\"slot").count(), 3);
        assert!(html.contains(r#"data-image-id="ash""#));
        assert!(html.contains(r#"class="slot placeholder""#));
        assert!(html.contains(r#"src="images/001-oak-thumb.jpg""#));
        assert!(html.contains(r#"src="images/003-elm-preview.jpg""#));
        assert!(html.contains("3 images, 2 processed"));
    }

    #[test]
    fn slot_caption_shows_dimensions_and_size() {
        let list = descriptors(&[("oak", "oak.jpg")]);
        let html = render_page("W", &entries(&list, &[true])).into_string();
        assert!(html.contains("oak · 4000×3000 · 1.5 KB"));
    }

    #[test]
    fn lightbox_links_wrap_around() {
        let list = descriptors(&[("a", "a.jpg"), ("b", "b.jpg"), ("c", "c.jpg")]);
        let html = render_page("W", &entries(&list, &[true, true, true])).into_string();

        let first = html.find(r#"id="lightbox-0""#).unwrap();
        let second = html.find(r#"id="lightbox-1""#).unwrap();
        let first_dialog = &html[first..second];
        assert!(first_dialog.contains(r##"href="#lightbox-2""##));
        assert!(first_dialog.contains(r##"href="#lightbox-1""##));

        let last = &html[html.find(r#"id="lightbox-2""#).unwrap()..];
        assert!(last.contains(r##"href="#lightbox-0""##));
        assert!(last.contains(r##"href="#lightbox-1""##));
    }

    #[test]
    fn download_link_uses_display_name() {
        let mut list = descriptors(&[("oak", "https://cdn.example/p/oak.jpg")]);
        list[0].display_name = "Oak Panel".into();
        let html = render_page("W", &entries(&list, &[false])).into_string();
        assert!(html.contains(r#"href="https://cdn.example/p/oak.jpg" download="Oak Panel.jpg""#));
    }

    #[test]
    fn names_are_html_escaped() {
        let mut list = descriptors(&[("x", "x.jpg")]);
        list[0].display_name = "<script>alert(1)</script>".into();
        let html = render_page("W", &entries(&list, &[true])).into_string();
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn render_gallery_writes_cached_rasters_and_originals() {
        let tmp = TempDir::new().unwrap();
        let mut config = GalleryConfig::default();
        config.loading.lazy = false;
        config.loading.frame_interval_ms = 0;
        let gallery = Gallery::new(
            descriptors(&[("oak", "oak.jpg"), ("bad", "bad.jpg")]),
            MockBackend::new(),
            MockSource::with_files(&[("oak.jpg", b"4000x3000"), ("bad.jpg", b"garbage")]),
            &config,
        );
        gallery.mount();

        let summary = render_gallery(&gallery, tmp.path(), "Catalog").unwrap();
        assert_eq!(summary.rendered, vec!["oak"]);
        assert_eq!(summary.placeholders, vec!["bad"]);
        assert_eq!(summary.originals_copied, 2);

        let thumb = fs::read(tmp.path().join("images/001-oak-thumb.jpg")).unwrap();
        assert_eq!(thumb, b"250x188@90");
        let preview = fs::read(tmp.path().join("images/001-oak-preview.jpg")).unwrap();
        assert_eq!(preview, b"2000x1500@95");
        assert_eq!(fs::read(tmp.path().join("originals/001-oak-oak.jpg")).unwrap(), b"4000x3000");

        let html = fs::read_to_string(&summary.index_path).unwrap();
        assert!(html.contains(r#"href="originals/001-oak-oak.jpg" download="oak.jpg""#));
    }

    #[test]
    fn originals_with_equal_display_names_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let mut list = descriptors(&[("a-oak", "a/oak.jpg"), ("b-oak", "b/oak.jpg")]);
        for d in &mut list {
            d.display_name = "oak".into();
        }
        let gallery = Gallery::new(
            list,
            MockBackend::new(),
            MockSource::with_files(&[("a/oak.jpg", b"300x200"), ("b/oak.jpg", b"200x300")]),
            &GalleryConfig::default(),
        );

        let summary = render_gallery(&gallery, tmp.path(), "Catalog").unwrap();
        assert_eq!(summary.originals_copied, 2);

        let a = tmp.path().join("originals/001-a-oak-oak.jpg");
        let b = tmp.path().join("originals/002-b-oak-oak.jpg");
        assert_eq!(fs::read(&a).unwrap(), b"300x200");
        assert_eq!(fs::read(&b).unwrap(), b"200x300");

        // Both links still offer the display name for saving
        let html = fs::read_to_string(&summary.index_path).unwrap();
        assert!(html.contains(r#"href="originals/001-a-oak-oak.jpg" download="oak.jpg""#));
        assert!(html.contains(r#"href="originals/002-b-oak-oak.jpg" download="oak.jpg""#));
    }
}
