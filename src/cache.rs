//! Per-page memoized link lists

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::LinkError;
use crate::host::LinkProvider;
use crate::types::Link;

/// Memo of each page's link list for one open document.
///
/// Populated lazily from the link provider, one provider call per page.
/// Invalidation is all-or-nothing: a document reload clears the whole
/// cache, individual pages are never dropped.
#[derive(Default)]
pub struct LinkCache {
    pages: HashMap<usize, Arc<[Link]>>,
}

impl LinkCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links on a page, fetching from the provider on first access
    pub fn links(
        &mut self,
        page: usize,
        provider: &dyn LinkProvider,
    ) -> Result<Arc<[Link]>, LinkError> {
        if let Some(links) = self.pages.get(&page) {
            return Ok(Arc::clone(links));
        }

        let links = provider
            .page_links(page)?
            .into_iter()
            .map(Link::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        let links: Arc<[Link]> = links.into();
        self.pages.insert(page, Arc::clone(&links));
        Ok(links)
    }

    /// Drop every cached page. Used on document reload/revert.
    pub fn invalidate_all(&mut self) {
        self.pages.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::{RawLink, Rect};

    struct CountingProvider {
        calls: Cell<usize>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl LinkProvider for CountingProvider {
        fn page_links(&self, page: usize) -> Result<Vec<RawLink>, LinkError> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![RawLink {
                rect: Rect::new(0.1, 0.1, 0.2, 0.2),
                kind: "goto-dest".into(),
                page: page + 2,
                ..Default::default()
            }])
        }
    }

    #[test]
    fn provider_called_once_per_page() {
        let provider = CountingProvider::new();
        let mut cache = LinkCache::new();

        let first = cache.links(0, &provider).unwrap();
        let second = cache.links(0, &provider).unwrap();
        assert_eq!(provider.calls.get(), 1);
        assert_eq!(first, second);

        cache.links(1, &provider).unwrap();
        assert_eq!(provider.calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_all_refetches() {
        let provider = CountingProvider::new();
        let mut cache = LinkCache::new();

        cache.links(0, &provider).unwrap();
        cache.invalidate_all();
        assert!(cache.is_empty());

        cache.links(0, &provider).unwrap();
        assert_eq!(provider.calls.get(), 2);
    }

    #[test]
    fn bad_kind_fails_and_is_not_cached() {
        struct BadProvider;
        impl LinkProvider for BadProvider {
            fn page_links(&self, _page: usize) -> Result<Vec<RawLink>, LinkError> {
                Ok(vec![RawLink {
                    kind: "embedded-file".into(),
                    ..Default::default()
                }])
            }
        }

        let mut cache = LinkCache::new();
        assert!(matches!(
            cache.links(0, &BadProvider),
            Err(LinkError::InvalidActionKind { .. })
        ));
        assert!(cache.is_empty());
    }
}
