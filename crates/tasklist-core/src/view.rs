//! Cached filtered view over an [`ItemStore`]

use crate::{Item, ItemFilter, ItemStore};

/// Visible subset of the store for the current filter.
///
/// Recomputed only when the store, its revision or the filter changed
/// since the last read, so callers can tell a re-render is unnecessary.
#[derive(Debug, Clone, Default)]
pub struct FilteredView {
    filter: ItemFilter,
    cache: Option<Cached>,
}

#[derive(Debug, Clone)]
struct Cached {
    store: u64,
    revision: u64,
    filter: ItemFilter,
    items: Vec<Item>,
}

impl FilteredView {
    pub fn new(filter: ItemFilter) -> Self {
        Self {
            filter,
            cache: None,
        }
    }

    pub fn filter(&self) -> &ItemFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ItemFilter) {
        self.filter = filter;
    }

    /// True if the next [`items`](Self::items) call will recompute
    pub fn is_stale(&self, store: &ItemStore) -> bool {
        match &self.cache {
            Some(c) => {
                c.store != store.instance()
                    || c.revision != store.revision()
                    || c.filter != self.filter
            }
            None => true,
        }
    }

    /// Items passing the filter, in store order
    pub fn items(&mut self, store: &ItemStore) -> &[Item] {
        if self.is_stale(store) {
            self.cache = Some(Cached {
                store: store.instance(),
                revision: store.revision(),
                filter: self.filter.clone(),
                items: store.visible(&self.filter),
            });
        }
        match &self.cache {
            Some(c) => &c.items,
            None => &[],
        }
    }
}
