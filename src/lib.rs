//! Link resolution, selection, and decoration core for a paginated
//! document viewer.
//!
//! The host viewer supplies parsed links, rendered page images, and
//! navigation (see [`host`]); this crate owns the per-page link cache,
//! pixel-space region projection, action execution, minimal-keystroke
//! link selection, search overlap ranking, and the background pipeline
//! that outlines links on page images via an external annotation tool.

pub mod cache;
pub mod command;
pub mod error;
pub mod host;
pub mod keyselect;
pub mod overlap;
pub mod pipeline;
pub mod regions;
pub mod resolver;
pub mod session;
pub mod types;

pub use cache::LinkCache;
pub use command::{ConvertTemplate, ExpandCtx};
pub use error::LinkError;
pub use host::{LinkProvider, Navigator, PageRenderer, SystemUriHandler, UriHandler};
pub use keyselect::{Feed, KeySelector, OverlayLabel, SelectToken, make_codes};
pub use overlap::{MIN_OVERLAP_RATIO, overlap_ratio, overlapping, pick};
pub use pipeline::{DECORATION_MARKER, DecorationConfig, DecorationPipeline, PipelineStatus};
pub use regions::{Region, RegionId, RegionKey, RegionMap};
pub use resolver::{describe, execute};
pub use session::DocumentSession;
pub use types::{Action, Link, PixelRect, RawLink, Rect};
