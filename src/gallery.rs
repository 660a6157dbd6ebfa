//! The gallery controller.
//!
//! A [`Gallery`] owns one descriptor list and everything derived from it: the
//! processed-image cache, the in-flight set, the visibility tracker, the batch
//! scheduler and the lightbox. Nothing is global, so two galleries built from
//! the same descriptors never see each other's work.
//!
//! ## Loading flow
//!
//! ```text
//! register_slot / observe(viewport)
//!         │ entered ids
//!         ▼
//!   pending(): drop cached + in-flight ids
//!         │
//!         ▼
//!   process_batch(): groups of batch_size, frame wait between groups
//!         │ per id: claim → fetch → decode once → thumbnail + preview
//!         ▼
//!   cache.insert → GalleryEvent::ImageReady
//! ```
//!
//! With lazy loading disabled, [`Gallery::mount`] schedules every descriptor
//! at once instead of waiting for viewport updates.
//!
//! ## Failures
//!
//! A failed fetch, decode or encode affects only its own descriptor: it is
//! logged, reported as [`GalleryEvent::ImageFailed`], and the slot keeps its
//! placeholder. There is no automatic retry; the id becomes eligible again the
//! next time it enters the viewport.
//!
//! ## Teardown
//!
//! [`Gallery::teardown`] disconnects the tracker, stops the scheduler (groups
//! not yet started are dropped) and closes the event channel. Work that is
//! already running finishes and lands in the cache; its events are dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ImageCache};
use crate::config::GalleryConfig;
use crate::imaging::{
    BackendError, ImageBackend, PreviewConfig, ThumbnailConfig, render_variants,
};
use crate::lightbox::{Key, Lightbox, LightboxFrame, LightboxState};
use crate::scheduler::{BatchScheduler, FrameClock, InFlight, IntervalClock, ScheduleReport};
use crate::source::{ImageSource, SourceError};
use crate::types::{ImageDescriptor, ImageMetadata, ProcessedImage};
use crate::visibility::{GridLayout, Rect, Viewport, VisibilityTracker};

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Fetch failed: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unknown image id: {0}")]
    UnknownImage(String),
}

/// Whether an image came from the cache or was built just now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Cached,
    Processed,
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    BatchStarted {
        images: usize,
        groups: usize,
    },
    ImageReady {
        /// Position in the descriptor list.
        index: usize,
        id: String,
        display_name: String,
        status: LoadStatus,
        metadata: ImageMetadata,
        thumbnail: (u32, u32),
        preview: (u32, u32),
    },
    ImageFailed {
        index: usize,
        id: String,
        display_name: String,
        reason: String,
    },
    BatchFinished(BatchSummary),
}

/// Counts for one [`Gallery::process_batch`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub cached: usize,
    pub failed: usize,
    /// Already claimed by another worker.
    pub skipped: usize,
    /// Groups dropped by teardown.
    pub groups_discarded: usize,
}

impl BatchSummary {
    fn absorb(&mut self, report: &ScheduleReport) {
        self.groups_discarded = report.groups_discarded;
    }
}

/// What a grid slot shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    /// Not started, or failed.
    Placeholder,
    Loading,
    Ready(Arc<ProcessedImage>),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One mounted gallery.
pub struct Gallery<B: ImageBackend, S: ImageSource> {
    descriptors: Vec<ImageDescriptor>,
    /// First position of each id.
    positions: HashMap<String, usize>,
    backend: B,
    source: S,
    thumbnail: ThumbnailConfig,
    preview: PreviewConfig,
    lazy: bool,
    cache: Mutex<ImageCache>,
    in_flight: InFlight,
    tracker: Mutex<VisibilityTracker>,
    lightbox: Mutex<Lightbox>,
    scheduler: BatchScheduler,
    events: Mutex<Option<Sender<GalleryEvent>>>,
    torn_down: AtomicBool,
}

impl<B: ImageBackend, S: ImageSource> Gallery<B, S> {
    pub fn new(
        descriptors: Vec<ImageDescriptor>,
        backend: B,
        source: S,
        config: &GalleryConfig,
    ) -> Self {
        let mut positions = HashMap::new();
        for (i, d) in descriptors.iter().enumerate() {
            positions.entry(d.id.clone()).or_insert(i);
        }
        let clock = IntervalClock::from_millis(config.loading.frame_interval_ms);
        Self {
            lightbox: Mutex::new(Lightbox::new(descriptors.len())),
            descriptors,
            positions,
            backend,
            source,
            thumbnail: config.thumbnail_config(),
            preview: config.preview_config(),
            lazy: config.loading.lazy,
            cache: Mutex::new(ImageCache::new(config.cache.max_entries)),
            in_flight: InFlight::new(),
            tracker: Mutex::new(VisibilityTracker::new(
                config.loading.lookahead_margin,
                config.loading.threshold,
            )),
            scheduler: BatchScheduler::new(config.loading.batch_size, Box::new(clock)),
            events: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Report progress on `sender`. Send errors are ignored.
    pub fn with_events(self, sender: Sender<GalleryEvent>) -> Self {
        *lock(&self.events) = Some(sender);
        self
    }

    /// Replace the frame clock used between groups.
    pub fn with_clock(mut self, clock: Box<dyn FrameClock>) -> Self {
        self.scheduler = BatchScheduler::new(self.scheduler.batch_size(), clock);
        self
    }

    pub fn descriptors(&self) -> &[ImageDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, id: &str) -> Option<&ImageDescriptor> {
        self.positions.get(id).map(|&i| &self.descriptors[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn emit(&self, event: GalleryEvent) {
        if let Some(tx) = lock(&self.events).as_ref() {
            let _ = tx.send(event);
        }
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Fetch, decode once and derive both rasters. Does not touch the cache.
    pub fn process(&self, descriptor: &ImageDescriptor) -> Result<ProcessedImage, GalleryError> {
        let bytes = self.source.fetch(&descriptor.source_url)?;
        let pair = render_variants(&self.backend, &bytes, &self.thumbnail, &self.preview)?;
        Ok(ProcessedImage {
            thumbnail: pair.thumbnail,
            preview: pair.preview,
            metadata: ImageMetadata {
                width: pair.source_width,
                height: pair.source_height,
                byte_size: descriptor.known_size.unwrap_or(bytes.len() as u64),
            },
        })
    }

    /// Serve from the cache, or process and publish.
    ///
    /// Concurrent callers for the same id do the work once: the caller that
    /// claims the id processes it, the others wait for the claim to drop and
    /// read the cache. When the holder failed, the next waiter tries itself.
    pub fn process_cached(
        &self,
        descriptor: &ImageDescriptor,
    ) -> Result<(Arc<ProcessedImage>, LoadStatus), GalleryError> {
        loop {
            if let Some(_claim) = self.in_flight.claim(&descriptor.id) {
                return self.load(descriptor);
            }
            debug!(id = %descriptor.id, "waiting for in-flight load");
            self.in_flight.wait_released(&descriptor.id);
        }
    }

    /// Cache lookup, then process and publish. The caller holds the claim.
    fn load(
        &self,
        descriptor: &ImageDescriptor,
    ) -> Result<(Arc<ProcessedImage>, LoadStatus), GalleryError> {
        if let Some(hit) = lock(&self.cache).get(&descriptor.id) {
            debug!(id = %descriptor.id, "cache hit");
            return Ok((hit, LoadStatus::Cached));
        }
        let image = Arc::new(self.process(descriptor)?);
        lock(&self.cache).insert(descriptor.id.clone(), Arc::clone(&image));
        Ok((image, LoadStatus::Processed))
    }

    /// Ids from `ids` that are known, not cached and not in flight.
    pub fn pending<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let cache = lock(&self.cache);
        ids.into_iter()
            .filter(|id| self.positions.contains_key(*id))
            .filter(|id| !cache.contains(id) && !self.in_flight.contains(id))
            .map(str::to_string)
            .collect()
    }

    /// Run `ids` through the scheduler. Blocks until done or torn down.
    pub fn process_batch(&self, ids: &[String]) -> BatchSummary {
        let groups = ids.len().div_ceil(self.scheduler.batch_size());
        if !ids.is_empty() && !self.is_torn_down() {
            self.emit(GalleryEvent::BatchStarted {
                images: ids.len(),
                groups,
            });
        }

        let processed = AtomicUsize::new(0);
        let cached = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        let report = self.scheduler.run(ids, |id| {
            let Some(index) = self.position(id) else {
                warn!(id = %id, "unknown image id");
                failed.fetch_add(1, Ordering::SeqCst);
                return;
            };
            let descriptor = &self.descriptors[index];

            let Some(_claim) = self.in_flight.claim(id) else {
                debug!(id = %id, "already in flight");
                skipped.fetch_add(1, Ordering::SeqCst);
                return;
            };

            match self.load(descriptor) {
                Ok((image, status)) => {
                    match status {
                        LoadStatus::Cached => cached.fetch_add(1, Ordering::SeqCst),
                        LoadStatus::Processed => processed.fetch_add(1, Ordering::SeqCst),
                    };
                    self.emit(GalleryEvent::ImageReady {
                        index,
                        id: descriptor.id.clone(),
                        display_name: descriptor.display_name.clone(),
                        status,
                        metadata: image.metadata,
                        thumbnail: (image.thumbnail.width, image.thumbnail.height),
                        preview: (image.preview.width, image.preview.height),
                    });
                }
                Err(e) => {
                    warn!(id = %descriptor.id, url = %descriptor.source_url, error = %e, "failed to load image");
                    failed.fetch_add(1, Ordering::SeqCst);
                    self.emit(GalleryEvent::ImageFailed {
                        index,
                        id: descriptor.id.clone(),
                        display_name: descriptor.display_name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        });

        let mut summary = BatchSummary {
            processed: processed.into_inner(),
            cached: cached.into_inner(),
            failed: failed.into_inner(),
            skipped: skipped.into_inner(),
            groups_discarded: 0,
        };
        summary.absorb(&report);
        if !ids.is_empty() {
            info!(
                processed = summary.processed,
                cached = summary.cached,
                failed = summary.failed,
                skipped = summary.skipped,
                discarded_groups = summary.groups_discarded,
                "batch finished"
            );
            self.emit(GalleryEvent::BatchFinished(summary.clone()));
        }
        summary
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Start the gallery. With lazy loading off, every descriptor is marked
    /// visible and processed now; otherwise nothing happens until
    /// [`observe`](Self::observe).
    pub fn mount(&self) -> BatchSummary {
        if self.lazy || self.is_torn_down() {
            return BatchSummary::default();
        }
        let ids: Vec<&str> = self.descriptors.iter().map(|d| d.id.as_str()).collect();
        lock(&self.tracker).mark_all_visible(ids.iter().copied());
        let pending = dedup(self.pending(ids));
        self.process_batch(&pending)
    }

    pub fn register_slot(&self, id: &str, rect: Rect) {
        if self.is_torn_down() {
            return;
        }
        lock(&self.tracker).register(id, rect);
    }

    pub fn deregister_slot(&self, id: &str) {
        lock(&self.tracker).deregister(id);
    }

    /// Register one slot per descriptor laid out on a responsive grid.
    pub fn register_grid(&self, container_width: f64) -> GridLayout {
        let grid = GridLayout::for_width(container_width);
        for (i, d) in self.descriptors.iter().enumerate() {
            self.register_slot(&d.id, grid.slot_rect(i));
        }
        grid
    }

    /// Viewport moved: process whatever newly entered and still needs work.
    pub fn observe(&self, viewport: &Viewport) -> BatchSummary {
        if self.is_torn_down() {
            return BatchSummary::default();
        }
        let change = lock(&self.tracker).observe(viewport);
        if change.entered.is_empty() {
            return BatchSummary::default();
        }
        let pending = dedup(self.pending(change.entered.iter().map(String::as_str)));
        debug!(entered = change.entered.len(), pending = pending.len(), "viewport changed");
        self.process_batch(&pending)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        lock(&self.tracker).is_visible(id)
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    pub fn slot_state(&self, id: &str) -> SlotState {
        if let Some(image) = lock(&self.cache).peek(id) {
            return SlotState::Ready(image);
        }
        if self.in_flight.contains(id) {
            SlotState::Loading
        } else {
            SlotState::Placeholder
        }
    }

    /// Cached result for `id` without counting a lookup.
    pub fn cached(&self, id: &str) -> Option<Arc<ProcessedImage>> {
        lock(&self.cache).peek(id)
    }

    /// Cached ids, oldest insertion first.
    pub fn cached_ids(&self) -> Vec<String> {
        lock(&self.cache).keys().map(str::to_string).collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        lock(&self.cache).stats().clone()
    }

    pub fn open(&self, index: usize) -> LightboxState {
        lock(&self.lightbox).open(index)
    }

    pub fn close(&self) -> LightboxState {
        lock(&self.lightbox).close()
    }

    pub fn next(&self) -> LightboxState {
        lock(&self.lightbox).next()
    }

    pub fn prev(&self) -> LightboxState {
        lock(&self.lightbox).prev()
    }

    pub fn handle_key(&self, key: Key) -> LightboxState {
        lock(&self.lightbox).handle_key(key)
    }

    pub fn backdrop_click(&self) -> LightboxState {
        lock(&self.lightbox).backdrop_click()
    }

    pub fn lightbox_state(&self) -> LightboxState {
        lock(&self.lightbox).state()
    }

    /// What the open lightbox shows, `None` while closed.
    pub fn lightbox_frame(&self) -> Option<LightboxFrame> {
        let index = self.lightbox_state().index()?;
        let id = &self.descriptors[index].id;
        Some(match self.cached(id) {
            Some(image) => LightboxFrame::Ready { index, image },
            None => LightboxFrame::Loading { index },
        })
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    /// Fetch the original again and save it into `dir` under its display name.
    pub fn download(&self, id: &str, dir: &Path) -> Result<PathBuf, GalleryError> {
        let descriptor = self
            .descriptor(id)
            .ok_or_else(|| GalleryError::UnknownImage(id.to_string()))?;
        self.download_as(id, dir, &download_filename(descriptor))
    }

    /// Like [`download`](Self::download) with an explicit file name, which is
    /// sanitized the same way.
    pub fn download_as(
        &self,
        id: &str,
        dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, GalleryError> {
        let descriptor = self
            .descriptor(id)
            .ok_or_else(|| GalleryError::UnknownImage(id.to_string()))?;
        let bytes = self.source.fetch(&descriptor.source_url)?;

        let file_name = match sanitize_file_name(file_name).as_str() {
            "" => download_filename(descriptor),
            clean => clean.to_string(),
        };
        let path = dir.join(file_name);
        std::fs::create_dir_all(dir).map_err(|source| GalleryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        std::fs::write(&path, &bytes).map_err(|source| GalleryError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(id = %id, path = %path.display(), bytes = bytes.len(), "downloaded original");
        Ok(path)
    }

    /// Unmount: ignore further viewport updates, drop unstarted groups and
    /// close the event channel.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.scheduler.stop();
        lock(&self.tracker).disconnect();
        lock(&self.events).take();
        debug!("gallery torn down");
    }
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Filename for saving a descriptor's original.
///
/// Path separators and control characters become `_` and leading dots are
/// dropped, in the display name and in the id used when the name is blank.
/// When the result has no extension the source URL's extension is appended.
pub fn download_filename(descriptor: &ImageDescriptor) -> String {
    let mut name = [descriptor.display_name.as_str(), descriptor.id.as_str()]
        .into_iter()
        .map(sanitize_file_name)
        .find(|n| !n.is_empty())
        .unwrap_or_else(|| "image".to_string());
    if Path::new(&name).extension().is_none() {
        if let Some(ext) = url_extension(&descriptor.source_url) {
            name.push('.');
            name.push_str(&ext);
        }
    }
    name
}

fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    // No hidden files, no `..`
    cleaned.trim_start_matches('.').to_string()
}

/// Extension of the last path segment of a URL, ignoring query and fragment.
pub fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    let valid = !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}
