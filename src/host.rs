//! Traits implemented by the host viewer.
//!
//! The core never renders pages, parses documents, or owns the UI; it
//! talks to the viewer through these seams. Each open document gets its
//! own set of collaborators, passed to [`crate::session::DocumentSession`].

use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::types::RawLink;

/// Source of the already-parsed link list for each page
pub trait LinkProvider {
    /// Links on a page (0-based). Called at most once per page per session.
    fn page_links(&self, page: usize) -> Result<Vec<RawLink>, LinkError>;
}

/// The viewer's page-image renderer/cache.
///
/// Page images live in `cache_dir()` and are named `page-<N>.<ext>`;
/// the decoration pipeline depends on that naming contract.
pub trait PageRenderer {
    /// Current render width in pixels
    fn render_width(&self) -> u32;

    /// Total page count
    fn page_count(&self) -> usize;

    /// Native page size (width, height) in document units
    fn page_size(&self, page: usize) -> (f32, f32);

    /// Per-document cache directory holding the rendered page images
    fn cache_dir(&self) -> PathBuf;

    /// Whether conversion of the document into page images has finished
    fn images_ready(&self) -> bool;

    /// The page currently shown to the user, if any
    fn displayed_page(&self) -> Option<usize>;

    /// Drop any cached display state keyed by this image path.
    /// Called after the pipeline overwrites a page image in place.
    fn invalidate_image(&self, path: &Path);
}

/// Viewer-side navigation used when executing link actions
pub trait Navigator {
    /// Show a page (1-based), optionally flashing an indicator at the
    /// given normalized vertical position.
    fn goto_page(&mut self, page: usize, top: Option<f32>);

    /// Open another document in the viewer. Returns whether the new
    /// context supports page navigation (so a remote goto can proceed).
    fn open_document(&mut self, file: &Path) -> Result<bool, LinkError>;
}

/// Pluggable URI handler for `Action::Uri`
pub trait UriHandler {
    fn handle(&self, uri: &str) -> Result<(), LinkError>;
}

/// Default handler that hands the URI to the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUriHandler;

impl UriHandler for SystemUriHandler {
    fn handle(&self, uri: &str) -> Result<(), LinkError> {
        open::that(uri).map_err(LinkError::Io)
    }
}
