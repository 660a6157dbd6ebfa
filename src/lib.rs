//! # Adaptive Gallery
//!
//! An image gallery engine for product catalogs. Each image is fetched and
//! decoded once, turned into a square-box thumbnail for the grid and a
//! bounded preview for the lightbox, and kept in a bounded cache so scrolling
//! back or reopening the lightbox never repeats the work.
//!
//! # Architecture
//!
//! ```text
//! descriptors ─▶ visibility tracker ─▶ batch scheduler ─▶ pipeline ─▶ cache ─▶ grid / lightbox
//!  (scan/JSON)    (viewport + margin)   (groups of 3,      (fetch,      (insertion-
//!                                        frame between)     decode,      order, 100)
//!                                                           resize,
//!                                                           encode)
//! ```
//!
//! Only slots near the viewport are processed. Work is split into small groups
//! with a frame wait in between, so a page of large originals never stalls the
//! caller. A failure in one image stays with that image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | The controller: owns cache, in-flight set, tracker, scheduler and lightbox; download |
//! | [`imaging`] | Pure-Rust pipeline: thumbnail/preview planning, Lanczos3 resize, JPEG encode |
//! | [`cache`] | Insertion-order bounded cache of processed images with hit/miss stats |
//! | [`visibility`] | Slot registration, lookahead-margin intersection, responsive grid layout |
//! | [`scheduler`] | Fixed-size groups on rayon with a frame clock between groups; in-flight claims |
//! | [`lightbox`] | `Closed` / `Open(i)` viewer state machine with wrap-around and key handling |
//! | [`source`] | Fetching originals from disk or over HTTP(S) |
//! | [`catalog`] | Descriptor list files, validation, filter / sort / pagination, size formatting |
//! | [`scan`] | Directory walk producing descriptors |
//! | [`render`] | Static HTML page with grid and lightboxes, rendered with Maud |
//! | [`config`] | Layered `config.toml` loading, validation and stock defaults |
//! | [`types`] | Descriptor and processed-image types |
//! | [`naming`] | Display names and slugs from file names |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Insertion-Order Eviction
//!
//! The cache drops the entry inserted earliest when full; reads do not move
//! entries. A catalog page is mostly scrolled top to bottom once, so recency of
//! access adds bookkeeping without changing what gets evicted in practice.
//!
//! ## One Decode per Image
//!
//! Thumbnail and preview are derived from the same decoded raster. Very large
//! sources take a two-pass path to the thumbnail (first to twice the box, then
//! to the box) which keeps Lanczos3 from spending its time on pixels that are
//! thrown away.
//!
//! ## No Globals
//!
//! Each [`gallery::Gallery`] owns its cache and in-flight set behind mutexes.
//! Two galleries on the same descriptors are fully independent.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod gallery;
pub mod imaging;
pub mod lightbox;
pub mod naming;
pub mod output;
pub mod render;
pub mod scan;
pub mod scheduler;
pub mod source;
pub mod types;
pub mod visibility;

#[cfg(test)]
pub(crate) mod test_helpers;
