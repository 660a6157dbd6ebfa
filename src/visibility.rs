//! Viewport visibility tracking for grid slots.
//!
//! Every grid slot registers its layout rectangle together with the id of
//! the image it shows. Each time the viewport moves, [`VisibilityTracker::observe`]
//! recomputes which slots intersect the viewport grown by a lookahead margin
//! and reports the ids that entered and left. The gallery then decides which
//! of the entered ids still need processing.
//!
//! A slot counts as visible when at least `threshold` of its area lies inside
//! the expanded viewport (and the overlap is not empty). With the defaults a
//! slot starts loading once a tenth of it is within 50px of the screen.

use std::collections::{BTreeSet, HashMap};

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Area of the overlap with `other`, 0 when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let left = self.x.max(other.x);
        let right = (self.x + self.width).min(other.x + other.width);
        let top = self.y.max(other.y);
        let bottom = (self.y + self.height).min(other.y + other.height);
        (right - left).max(0.0) * (bottom - top).max(0.0)
    }
}

/// The scrolled window onto the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, width: f64, height: f64) -> Self {
        Self {
            scroll_top,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, self.scroll_top, self.width, self.height)
    }
}

/// Ids whose visibility flipped during one observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityChange {
    /// Newly visible, in slot registration order.
    pub entered: Vec<String>,
    pub left: Vec<String>,
}

impl VisibilityChange {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.left.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    id: String,
    rect: Rect,
    seq: u64,
}

/// Tracks registered slots and the current visibility set.
#[derive(Debug)]
pub struct VisibilityTracker {
    margin: f64,
    threshold: f64,
    slots: HashMap<String, Slot>,
    visible: BTreeSet<String>,
    next_seq: u64,
    disconnected: bool,
}

impl VisibilityTracker {
    pub fn new(margin: f64, threshold: f64) -> Self {
        Self {
            margin: margin.max(0.0),
            threshold: threshold.clamp(0.0, 1.0),
            slots: HashMap::new(),
            visible: BTreeSet::new(),
            next_seq: 0,
            disconnected: false,
        }
    }

    /// Register (or move) the slot showing image `id`.
    pub fn register(&mut self, id: impl Into<String>, rect: Rect) {
        if self.disconnected {
            return;
        }
        let id = id.into();
        let seq = match self.slots.get(&id) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.slots.insert(id.clone(), Slot { id, rect, seq });
    }

    /// Forget a slot. Its id also leaves the visibility set.
    pub fn deregister(&mut self, id: &str) {
        self.slots.remove(id);
        self.visible.remove(id);
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    /// Current visibility set.
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.visible.iter().map(String::as_str)
    }

    /// Mark ids visible without geometry (lazy loading disabled).
    pub fn mark_all_visible<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        if self.disconnected {
            return;
        }
        self.visible.extend(ids.into_iter().map(str::to_string));
    }

    /// Whether a slot rectangle counts as visible in `viewport`.
    pub fn intersects(&self, rect: &Rect, viewport: &Viewport) -> bool {
        let area = rect.area();
        if area <= 0.0 {
            return false;
        }
        let overlap = rect.intersection_area(&viewport.rect().expand(self.margin));
        overlap > 0.0 && overlap / area >= self.threshold
    }

    /// Recompute the visibility set for `viewport`.
    ///
    /// After [`disconnect`](Self::disconnect) this is a no-op.
    pub fn observe(&mut self, viewport: &Viewport) -> VisibilityChange {
        if self.disconnected {
            return VisibilityChange::default();
        }

        let mut ordered: Vec<&Slot> = self.slots.values().collect();
        ordered.sort_by_key(|slot| slot.seq);

        let mut change = VisibilityChange::default();
        let mut now_visible = BTreeSet::new();
        for slot in ordered {
            if self.intersects(&slot.rect, viewport) {
                if !self.visible.contains(&slot.id) {
                    change.entered.push(slot.id.clone());
                }
                now_visible.insert(slot.id.clone());
            }
        }
        change.left = self
            .visible
            .difference(&now_visible)
            .filter(|id| self.slots.contains_key(*id))
            .cloned()
            .collect();

        // Ids marked visible without a slot stay visible
        let unslotted: Vec<String> = self
            .visible
            .iter()
            .filter(|id| !self.slots.contains_key(*id))
            .cloned()
            .collect();
        now_visible.extend(unslotted);
        self.visible = now_visible;
        change
    }

    /// Stop observing. Registrations and viewport updates are ignored afterwards.
    pub fn disconnect(&mut self) {
        self.disconnected = true;
        self.slots.clear();
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

/// Responsive square-slot grid: 2/3/4/5 columns with a 16px gap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub gap: f64,
    pub slot_size: f64,
}

impl GridLayout {
    pub const GAP: f64 = 16.0;

    /// Column count for a container width (768 / 1024 / 1280 breakpoints).
    pub fn columns_for_width(width: f64) -> usize {
        if width >= 1280.0 {
            5
        } else if width >= 1024.0 {
            4
        } else if width >= 768.0 {
            3
        } else {
            2
        }
    }

    pub fn for_width(width: f64) -> Self {
        let columns = Self::columns_for_width(width);
        let gaps = Self::GAP * (columns as f64 - 1.0);
        let slot_size = ((width - gaps) / columns as f64).max(1.0);
        Self {
            columns,
            gap: Self::GAP,
            slot_size,
        }
    }

    /// Rectangle of the slot at `index` (row-major).
    pub fn slot_rect(&self, index: usize) -> Rect {
        let row = index / self.columns;
        let col = index % self.columns;
        let step = self.slot_size + self.gap;
        Rect::new(col as f64 * step, row as f64 * step, self.slot_size, self.slot_size)
    }

    /// Total grid height for `count` slots.
    pub fn content_height(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let rows = count.div_ceil(self.columns);
        rows as f64 * self.slot_size + (rows as f64 - 1.0) * self.gap
    }
}
