//! Projection of normalized link rects into clickable pixel regions

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::LinkCache;
use crate::error::LinkError;
use crate::host::{LinkProvider, PageRenderer};
use crate::resolver;
use crate::types::{Action, PixelRect};

/// Unique identifier for a projected region within one session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionId(pub u64);

/// Cache key: projections depend on the page and the render width
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub page: usize,
    pub width: u32,
}

/// A link's rectangle projected into pixel space, plus everything the
/// click/render layer needs to act on it
#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub rect: PixelRect,
    pub action: Action,
    /// Human-readable description shown on hover/echo
    pub label: String,
}

/// Projected region maps keyed by `(page, width)`.
///
/// A zoom change produces a fresh entry rather than rescaling an old one;
/// pixel rounding makes the scaling irreversible, so each width is
/// computed from the normalized rects directly. Region ids double as the
/// dispatch table consulted by the click layer, replacing any notion of
/// per-region input rebinding.
#[derive(Default)]
pub struct RegionMap {
    entries: HashMap<RegionKey, Arc<[Region]>>,
    dispatch: HashMap<RegionId, (RegionKey, usize)>,
    next_id: u64,
}

impl RegionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions for a page at the given render width, projecting on first
    /// access. Target height is derived from the page's native aspect.
    pub fn project(
        &mut self,
        page: usize,
        width: u32,
        links: &mut LinkCache,
        provider: &dyn LinkProvider,
        renderer: &dyn PageRenderer,
    ) -> Result<Arc<[Region]>, LinkError> {
        let key = RegionKey { page, width };
        if let Some(regions) = self.entries.get(&key) {
            return Ok(Arc::clone(regions));
        }

        let links = links.links(page, provider)?;
        let (page_w, page_h) = renderer.page_size(page);
        let height = if page_w > 0.0 {
            (width as f32 * page_h / page_w) as u32
        } else {
            width
        };

        let regions: Vec<Region> = links
            .iter()
            .enumerate()
            .map(|(index, link)| {
                let id = RegionId(self.next_id + index as u64);
                Region {
                    id,
                    rect: link.rect.to_pixels(width, height),
                    action: link.action.clone(),
                    label: resolver::describe(link),
                }
            })
            .collect();
        self.next_id += regions.len() as u64;

        for (index, region) in regions.iter().enumerate() {
            self.dispatch.insert(region.id, (key, index));
        }

        let regions: Arc<[Region]> = regions.into();
        self.entries.insert(key, Arc::clone(&regions));
        Ok(regions)
    }

    /// Look up a region by id, for click dispatch
    #[must_use]
    pub fn resolve(&self, id: RegionId) -> Option<&Region> {
        let (key, index) = self.dispatch.get(&id)?;
        self.entries.get(key)?.get(*index)
    }

    /// Hit-test a pixel position against a projected page
    #[must_use]
    pub fn region_at(&self, page: usize, width: u32, x: u32, y: u32) -> Option<&Region> {
        let regions = self.entries.get(&RegionKey { page, width })?;
        regions.iter().find(|r| r.rect.contains(x, y))
    }

    /// Already-projected regions, without triggering a projection
    #[must_use]
    pub fn get(&self, page: usize, width: u32) -> Option<Arc<[Region]>> {
        self.entries.get(&RegionKey { page, width }).cloned()
    }

    /// Drop all projections and dispatch entries. Used on reload.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.dispatch.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::types::{RawLink, Rect};

    struct FixedProvider;

    impl LinkProvider for FixedProvider {
        fn page_links(&self, _page: usize) -> Result<Vec<RawLink>, LinkError> {
            Ok(vec![
                RawLink {
                    rect: Rect::new(0.0, 0.0, 0.5, 0.25),
                    kind: "goto-dest".into(),
                    page: 3,
                    ..Default::default()
                },
                RawLink {
                    rect: Rect::new(0.5, 0.5, 1.0, 0.75),
                    kind: "uri".into(),
                    uri: Some("https://example.org".into()),
                    ..Default::default()
                },
            ])
        }
    }

    struct FixedRenderer;

    impl PageRenderer for FixedRenderer {
        fn render_width(&self) -> u32 {
            400
        }
        fn page_count(&self) -> usize {
            1
        }
        fn page_size(&self, _page: usize) -> (f32, f32) {
            // 1:2 aspect, so height = 2 * width
            (100.0, 200.0)
        }
        fn cache_dir(&self) -> PathBuf {
            PathBuf::new()
        }
        fn images_ready(&self) -> bool {
            true
        }
        fn displayed_page(&self) -> Option<usize> {
            Some(0)
        }
        fn invalidate_image(&self, _path: &Path) {}
    }

    #[test]
    fn project_scales_by_width_and_aspect() {
        let mut cache = LinkCache::new();
        let mut map = RegionMap::new();
        let regions = map
            .project(0, 400, &mut cache, &FixedProvider, &FixedRenderer)
            .unwrap();

        assert_eq!(regions.len(), 2);
        // width 400, derived height 800
        assert_eq!(regions[0].rect, PixelRect::new(0, 0, 200, 200));
        assert_eq!(regions[1].rect, PixelRect::new(200, 400, 400, 600));
        assert_eq!(regions[0].label, "Goto page 3");
    }

    #[test]
    fn widths_get_independent_entries_with_fresh_ids() {
        let mut cache = LinkCache::new();
        let mut map = RegionMap::new();

        let narrow = map
            .project(0, 400, &mut cache, &FixedProvider, &FixedRenderer)
            .unwrap();
        let wide = map
            .project(0, 800, &mut cache, &FixedProvider, &FixedRenderer)
            .unwrap();

        assert_eq!(map.len(), 2);
        assert_ne!(narrow[0].id, wide[0].id);
        assert_eq!(wide[0].rect, PixelRect::new(0, 0, 400, 400));

        // Repeat lookup hits the cache, ids stay stable
        let again = map
            .project(0, 400, &mut cache, &FixedProvider, &FixedRenderer)
            .unwrap();
        assert_eq!(again[0].id, narrow[0].id);
    }

    #[test]
    fn resolve_dispatches_to_action() {
        let mut cache = LinkCache::new();
        let mut map = RegionMap::new();
        let regions = map
            .project(0, 400, &mut cache, &FixedProvider, &FixedRenderer)
            .unwrap();

        let resolved = map.resolve(regions[1].id).unwrap();
        assert_eq!(
            resolved.action,
            Action::Uri {
                uri: "https://example.org".into()
            }
        );
        assert!(map.resolve(RegionId(9999)).is_none());
    }

    #[test]
    fn region_at_hit_tests() {
        let mut cache = LinkCache::new();
        let mut map = RegionMap::new();
        map.project(0, 400, &mut cache, &FixedProvider, &FixedRenderer)
            .unwrap();

        assert!(map.region_at(0, 400, 10, 10).is_some());
        assert!(map.region_at(0, 400, 399, 10).is_none());
        assert!(map.region_at(0, 800, 10, 10).is_none());
    }

    #[test]
    fn invalidate_all_clears_dispatch() {
        let mut cache = LinkCache::new();
        let mut map = RegionMap::new();
        let regions = map
            .project(0, 400, &mut cache, &FixedProvider, &FixedRenderer)
            .unwrap();
        let id = regions[0].id;

        map.invalidate_all();
        assert!(map.is_empty());
        assert!(map.resolve(id).is_none());
    }
}
