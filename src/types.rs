//! Core types for page links and their actions

use std::path::PathBuf;

use crate::error::LinkError;

/// Axis-aligned box in normalized page coordinates (0.0–1.0 on each axis)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Create a normalized rect, fixing flipped corners and clamping to the unit square
    #[must_use]
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let (x0, x1) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (y0, y1) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        Self {
            x0: x0.clamp(0.0, 1.0),
            y0: y0.clamp(0.0, 1.0),
            x1: x1.clamp(0.0, 1.0),
            y1: y1.clamp(0.0, 1.0),
        }
    }

    /// Scale into pixel space for the given render dimensions
    #[must_use]
    pub fn to_pixels(self, width: u32, height: u32) -> PixelRect {
        PixelRect {
            x0: (self.x0 * width as f32) as u32,
            y0: (self.y0 * height as f32) as u32,
            x1: (self.x1 * width as f32).ceil() as u32,
            y1: (self.y1 * height as f32).ceil() as u32,
        }
    }
}

/// Link rectangle projected into pixel coordinates for a specific render width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    #[must_use]
    pub const fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Intersection with another rect, or `None` when the overlap is empty
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x0 < x1 && y0 < y1 {
            Some(Self { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// What following a link does
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Jump to a page of the current document (1-based; 0 means broken)
    GotoDest { page: usize, top: f32 },
    /// Open another document, optionally at a page (0 = no specific location)
    GotoRemote {
        file: PathBuf,
        page: usize,
        top: f32,
    },
    /// Run an external program. Never executed, only described.
    Launch { program: PathBuf, args: String },
    /// Open a URI with the configured handler
    Uri { uri: String },
}

/// A clickable region on a page plus its associated action
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub rect: Rect,
    pub action: Action,
    pub title: Option<String>,
}

/// Untyped link data as reported by a link provider.
///
/// Providers hand back a kind tag plus whichever fields that kind uses;
/// `Link::from_raw` is the single place unknown kinds are rejected.
#[derive(Clone, Debug, Default)]
pub struct RawLink {
    pub rect: Rect,
    pub kind: String,
    pub page: usize,
    pub top: f32,
    pub file: Option<PathBuf>,
    pub uri: Option<String>,
    pub program: Option<PathBuf>,
    pub args: Option<String>,
    pub title: Option<String>,
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
        }
    }
}

impl Link {
    /// Convert a provider's raw link into a typed one.
    ///
    /// Fails with `InvalidActionKind` for a kind tag outside the four
    /// supported action kinds.
    pub fn from_raw(raw: RawLink) -> Result<Self, LinkError> {
        let action = match raw.kind.as_str() {
            "goto-dest" => Action::GotoDest {
                page: raw.page,
                top: raw.top,
            },
            "goto-remote" => Action::GotoRemote {
                file: raw.file.unwrap_or_default(),
                page: raw.page,
                top: raw.top,
            },
            "launch" => Action::Launch {
                program: raw.program.unwrap_or_default(),
                args: raw.args.unwrap_or_default(),
            },
            "uri" => Action::Uri {
                uri: raw.uri.unwrap_or_default(),
            },
            other => {
                return Err(LinkError::InvalidActionKind {
                    kind: other.to_string(),
                });
            }
        };

        Ok(Self {
            rect: raw.rect,
            action,
            title: raw.title.filter(|t| !t.is_empty()),
        })
    }
}
