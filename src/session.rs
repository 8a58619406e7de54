//! Per-document session owning the link cache, region map, and pipeline.
//!
//! One session per open document, passed explicitly to every operation;
//! there is no global state. Sessions never share caches or pipeline
//! instances, so no cross-document locking exists anywhere in the crate.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::cache::LinkCache;
use crate::error::LinkError;
use crate::host::{LinkProvider, Navigator, PageRenderer, UriHandler};
use crate::keyselect::KeySelector;
use crate::overlap;
use crate::pipeline::{DecorationConfig, DecorationPipeline, PipelineStatus};
use crate::regions::{Region, RegionId, RegionMap};
use crate::resolver;
use crate::types::{Action, Link, PixelRect};

/// Everything link-related for one open document
pub struct DocumentSession {
    provider: Box<dyn LinkProvider>,
    renderer: Box<dyn PageRenderer>,
    uri_handler: Box<dyn UriHandler>,
    links: LinkCache,
    regions: RegionMap,
    pipeline: DecorationPipeline,
}

impl DocumentSession {
    #[must_use]
    pub fn new(
        provider: Box<dyn LinkProvider>,
        renderer: Box<dyn PageRenderer>,
        uri_handler: Box<dyn UriHandler>,
        decoration: DecorationConfig,
    ) -> Self {
        Self {
            provider,
            renderer,
            uri_handler,
            links: LinkCache::new(),
            regions: RegionMap::new(),
            pipeline: DecorationPipeline::new(decoration),
        }
    }

    /// Links on a page, memoized for the session
    pub fn links(&mut self, page: usize) -> Result<Arc<[Link]>, LinkError> {
        self.links.links(page, self.provider.as_ref())
    }

    /// Clickable regions for a page at the current render width
    pub fn regions(&mut self, page: usize) -> Result<Arc<[Region]>, LinkError> {
        let width = self.renderer.render_width();
        self.regions.project(
            page,
            width,
            &mut self.links,
            self.provider.as_ref(),
            self.renderer.as_ref(),
        )
    }

    /// Click dispatch: the action behind a region id, if still mapped
    #[must_use]
    pub fn resolve_region(&self, id: RegionId) -> Option<&Action> {
        self.regions.resolve(id).map(|r| &r.action)
    }

    /// Hit-test a click position on a page
    #[must_use]
    pub fn region_at(&self, page: usize, x: u32, y: u32) -> Option<&Region> {
        self.regions
            .region_at(page, self.renderer.render_width(), x, y)
    }

    /// Human-readable description of a link
    #[must_use]
    pub fn describe(&self, link: &Link) -> String {
        resolver::describe(link)
    }

    /// Execute an already-identified link action
    pub fn execute_action(
        &mut self,
        action: &Action,
        navigator: &mut dyn Navigator,
    ) -> Result<(), LinkError> {
        resolver::execute(action, navigator, self.uri_handler.as_ref())
    }

    /// Start an interactive key-code selection over a page's links.
    /// The host draws the overlay labels and loops `feed` on the result.
    pub fn select_links(&mut self, page: usize) -> Result<KeySelector, LinkError> {
        let regions = self.regions(page)?;
        KeySelector::new(
            page,
            &regions,
            self.renderer.displayed_page(),
            self.renderer.render_width(),
        )
    }

    /// Links overlapping a search-match rectangle, best overlap first.
    /// Used to jump to the link under the current match.
    pub fn links_under_match(
        &mut self,
        page: usize,
        match_rect: PixelRect,
    ) -> Result<Vec<Region>, LinkError> {
        let regions = self.regions(page)?;
        Ok(overlap::pick(&match_rect, &regions)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Observer the renderer calls after producing a page image, so the
    /// region map is ready before the page is displayed
    pub fn on_page_rendered(&mut self, page: usize, path: &Path) {
        debug!("Page {page} rendered at {}", path.display());
        if let Err(e) = self.regions(page) {
            debug!("Region projection for page {page} deferred: {e}");
        }
    }

    /// Document reloaded or reverted: drop every cache, stop decoration
    pub fn on_document_reloaded(&mut self) {
        self.links.invalidate_all();
        self.regions.invalidate_all();
        self.pipeline.cancel();
    }

    /// Queue background decoration of the document's page images
    pub fn schedule_decoration(&mut self, immediate: bool) {
        self.pipeline.schedule(
            immediate,
            &mut self.links,
            self.provider.as_ref(),
            self.renderer.as_ref(),
        );
    }

    /// Drive decoration one cooperative step; call from the event loop
    pub fn poll_decoration(&mut self) {
        self.pipeline.poll(
            &mut self.links,
            self.provider.as_ref(),
            self.renderer.as_ref(),
        );
    }

    /// Stop decoration and release its transient resources
    pub fn cancel_decoration(&mut self) {
        self.pipeline.cancel();
    }

    #[must_use]
    pub fn decoration_status(&self) -> PipelineStatus {
        self.pipeline.status()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::host::SystemUriHandler;
    use crate::keyselect::{Feed, SelectToken};
    use crate::types::{RawLink, Rect};

    struct TwoLinkProvider;

    impl LinkProvider for TwoLinkProvider {
        fn page_links(&self, _page: usize) -> Result<Vec<RawLink>, LinkError> {
            Ok(vec![
                RawLink {
                    rect: Rect::new(0.0, 0.0, 0.2, 0.1),
                    kind: "goto-dest".into(),
                    page: 5,
                    ..Default::default()
                },
                RawLink {
                    rect: Rect::new(0.0, 0.5, 0.2, 0.6),
                    kind: "uri".into(),
                    uri: Some("https://example.org".into()),
                    ..Default::default()
                },
            ])
        }
    }

    struct StubRenderer {
        displayed: Option<usize>,
    }

    impl PageRenderer for StubRenderer {
        fn render_width(&self) -> u32 {
            600
        }
        fn page_count(&self) -> usize {
            2
        }
        fn page_size(&self, _page: usize) -> (f32, f32) {
            (300.0, 400.0)
        }
        fn cache_dir(&self) -> PathBuf {
            PathBuf::new()
        }
        fn images_ready(&self) -> bool {
            false
        }
        fn displayed_page(&self) -> Option<usize> {
            self.displayed
        }
        fn invalidate_image(&self, _path: &Path) {}
    }

    fn session(displayed: Option<usize>) -> DocumentSession {
        DocumentSession::new(
            Box::new(TwoLinkProvider),
            Box::new(StubRenderer { displayed }),
            Box::new(SystemUriHandler),
            DecorationConfig::default(),
        )
    }

    #[test]
    fn select_links_feeds_to_done() {
        let mut session = session(Some(0));
        let mut selector = session.select_links(0).unwrap();
        assert_eq!(
            selector.feed(SelectToken::Letter('b')),
            Feed::Done(Action::Uri {
                uri: "https://example.org".into()
            })
        );
    }

    #[test]
    fn select_links_requires_displayed_page() {
        let mut session = session(Some(1));
        assert!(matches!(
            session.select_links(0),
            Err(LinkError::PageNotReady { page: 0 })
        ));
    }

    #[test]
    fn region_dispatch_survives_until_reload() {
        let mut session = session(Some(0));
        let regions = session.regions(0).unwrap();
        let id = regions[0].id;

        assert_eq!(
            session.resolve_region(id),
            Some(&Action::GotoDest { page: 5, top: 0.0 })
        );

        session.on_document_reloaded();
        assert!(session.resolve_region(id).is_none());
    }

    #[test]
    fn links_under_match_picks_overlapping() {
        let mut session = session(Some(0));
        // Page is 600x800; first link occupies y 0..80
        let hits = session
            .links_under_match(0, PixelRect::new(0, 0, 50, 50))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].action, Action::GotoDest { page: 5, top: 0.0 });
    }
}
