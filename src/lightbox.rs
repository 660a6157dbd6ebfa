//! Full-screen viewer state machine.
//!
//! ```text
//!            open(i)               next / prev (wrap mod N)
//!  Closed ───────────▶ Open(i) ◀─────────────────────────┐
//!     ▲                  │ │                              │
//!     └──── close ───────┘ └──────────────────────────────┘
//! ```
//!
//! The machine only tracks positions. What the open frame shows (a cached
//! preview or a loading indicator) is decided by the gallery, which owns the
//! cache.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::types::ProcessedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightboxState {
    #[default]
    Closed,
    Open(usize),
}

impl LightboxState {
    pub fn index(&self) -> Option<usize> {
        match self {
            LightboxState::Closed => None,
            LightboxState::Open(i) => Some(*i),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, LightboxState::Open(_))
    }
}

/// Keys the viewer reacts to. Everything else maps to [`Key::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    /// Parse DOM-style key names (`"Escape"`, `"ArrowLeft"`, `"ArrowRight"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            _ => Key::Other,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::Escape => "Escape",
            Key::ArrowLeft => "ArrowLeft",
            Key::ArrowRight => "ArrowRight",
            Key::Other => "other",
        };
        f.write_str(name)
    }
}

/// What the open viewer displays.
#[derive(Debug, Clone, PartialEq)]
pub enum LightboxFrame {
    /// The current image has not been processed yet.
    Loading { index: usize },
    Ready {
        index: usize,
        image: Arc<ProcessedImage>,
    },
}

impl LightboxFrame {
    pub fn index(&self) -> usize {
        match self {
            LightboxFrame::Loading { index } | LightboxFrame::Ready { index, .. } => *index,
        }
    }
}

/// Viewer over a gallery of `len` images.
#[derive(Debug, Clone, Default)]
pub struct Lightbox {
    state: LightboxState,
    len: usize,
}

impl Lightbox {
    pub fn new(len: usize) -> Self {
        Self {
            state: LightboxState::Closed,
            len,
        }
    }

    pub fn state(&self) -> LightboxState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Open at `index`. Out-of-range indices are ignored.
    pub fn open(&mut self, index: usize) -> LightboxState {
        if index < self.len {
            self.state = LightboxState::Open(index);
        }
        self.state
    }

    pub fn close(&mut self) -> LightboxState {
        self.state = LightboxState::Closed;
        self.state
    }

    pub fn next(&mut self) -> LightboxState {
        if let LightboxState::Open(i) = self.state {
            self.state = LightboxState::Open((i + 1) % self.len);
        }
        self.state
    }

    pub fn prev(&mut self) -> LightboxState {
        if let LightboxState::Open(i) = self.state {
            self.state = LightboxState::Open((i + self.len - 1) % self.len);
        }
        self.state
    }

    /// Keyboard handling while open. Keys do nothing when closed.
    pub fn handle_key(&mut self, key: Key) -> LightboxState {
        if !self.state.is_open() {
            return self.state;
        }
        match key {
            Key::Escape => self.close(),
            Key::ArrowLeft => self.prev(),
            Key::ArrowRight => self.next(),
            Key::Other => self.state,
        }
    }

    /// A click on the backdrop outside the image closes the viewer.
    pub fn backdrop_click(&mut self) -> LightboxState {
        self.close()
    }
}
