//! Local item store
//!
//! An insertion-ordered mirror of the items the service has confirmed.
//! Nothing here performs I/O; the sync client feeds transitions in after
//! each successful remote call.

use crate::{Error, Item, ItemFilter, Result};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

/// A successful transition of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Collection replaced wholesale
    Loaded { count: usize },
    /// Item appended at the end
    Inserted(Item),
    /// Item overwritten in place
    Replaced(Item),
    /// Item with this id deleted
    Removed(String),
}

/// Receives every successful store transition
pub trait CollectionChangeListener: Send {
    fn on_change(&mut self, event: &ChangeEvent);
}

impl<F> CollectionChangeListener for F
where
    F: FnMut(&ChangeEvent) + Send,
{
    fn on_change(&mut self, event: &ChangeEvent) {
        self(event)
    }
}

/// Handle returned by [`ItemStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered, id-keyed item collection
pub struct ItemStore {
    instance: u64,
    items: IndexMap<String, Item>,
    revision: u64,
    listeners: Vec<(SubscriptionId, Box<dyn CollectionChangeListener>)>,
    next_subscription: u64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            items: IndexMap::new(),
            revision: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection.
    ///
    /// Ids must be unique. If they are not, the last record for an id wins
    /// and keeps the position of the first occurrence.
    pub fn load(&mut self, items: Vec<Item>) {
        self.items = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        let count = self.items.len();
        self.commit(ChangeEvent::Loaded { count });
    }

    /// Append a new item; fails if the id is already present
    pub fn insert(&mut self, item: Item) -> Result<()> {
        if self.items.contains_key(&item.id) {
            tracing::warn!(id = %item.id, "insert rejected: item already in store");
            return Err(Error::AlreadyExists(item.id));
        }
        self.items.insert(item.id.clone(), item.clone());
        self.commit(ChangeEvent::Inserted(item));
        Ok(())
    }

    /// Overwrite an existing item in place, keeping its position
    pub fn replace(&mut self, item: Item) -> Result<()> {
        let Some(slot) = self.items.get_mut(&item.id) else {
            tracing::warn!(id = %item.id, "replace rejected: item not in store");
            return Err(Error::NotFound(item.id));
        };
        *slot = item.clone();
        self.commit(ChangeEvent::Replaced(item));
        Ok(())
    }

    /// Delete exactly one item; fails if the id is absent
    pub fn remove(&mut self, id: &str) -> Result<()> {
        if self.items.shift_remove(id).is_none() {
            tracing::warn!(id, "remove rejected: item not in store");
            return Err(Error::NotFound(id.to_string()));
        }
        self.commit(ChangeEvent::Removed(id.to_string()));
        Ok(())
    }

    /// Current items in order (an owned copy)
    pub fn snapshot(&self) -> Vec<Item> {
        self.items.values().cloned().collect()
    }

    /// Items passing `filter`, in order
    pub fn visible(&self, filter: &ItemFilter) -> Vec<Item> {
        self.items
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Position of an item in the ordered collection
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.get_index_of(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bumped on every successful transition
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Process-unique id of this store; revisions only compare within one
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Register a listener for future transitions
    pub fn subscribe<L>(&mut self, listener: L) -> SubscriptionId
    where
        L: CollectionChangeListener + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, event: ChangeEvent) {
        self.revision += 1;
        tracing::debug!(revision = self.revision, ?event, "store updated");
        for (_, listener) in &mut self.listeners {
            listener.on_change(&event);
        }
    }
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemStore")
            .field("instance", &self.instance)
            .field("items", &self.items)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
