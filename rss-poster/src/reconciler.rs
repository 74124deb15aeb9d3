use crate::item::Item;
use crate::types::{FeedMetadata, RawFeed};
use crate::window::RunWindow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Counters for one feed passed through [`Reconciler::ingest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub seen: usize,
    pub rejected: usize,
    pub out_of_window: usize,
    pub inserted: usize,
    pub merged: usize,
}

/// Merges entries from all feeds of a run into one item per guid.
///
/// Items live in an arena in first-seen order and are indexed by guid. The
/// first occurrence of a guid fixes the item's scalar fields; every later
/// occurrence only adds the contributing feed's languages and categories.
pub struct Reconciler {
    window: RunWindow,
    items: Vec<Item>,
    index: HashMap<String, usize>,
}

impl Reconciler {
    pub fn new(window: RunWindow) -> Self {
        Self {
            window,
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Validates, window-filters and merges every entry of one feed.
    pub fn ingest(&mut self, feed: &RawFeed) -> IngestStats {
        let metadata = FeedMetadata::from(feed);
        let mut stats = IngestStats::default();

        for entry in &feed.items {
            stats.seen += 1;

            let Some(item) = Item::from_raw(entry) else {
                stats.rejected += 1;
                continue;
            };
            if !self.window.accepts(&item) {
                stats.out_of_window += 1;
                continue;
            }

            if self.merge(item, metadata) {
                stats.merged += 1;
            } else {
                stats.inserted += 1;
            }
        }

        debug!(
            "Ingested feed '{}': {:?}",
            feed.title.as_deref().unwrap_or_default(),
            stats
        );
        stats
    }

    /// Inserts `item` or folds `feed` into the existing item with the same guid.
    /// Returns `true` when the guid was already known.
    pub fn merge(&mut self, item: Item, feed: FeedMetadata<'_>) -> bool {
        match self.index.entry(item.guid.clone()) {
            Entry::Occupied(slot) => {
                let existing = &mut self.items[*slot.get()];
                debug!("Merging duplicate guid {} into '{}'", existing.guid, existing.title);
                existing.add_metadata(feed);
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(self.items.len());
                let mut item = item;
                item.add_metadata(feed);
                self.items.push(item);
                false
            }
        }
    }

    pub fn get(&self, guid: &str) -> Option<&Item> {
        self.index.get(guid).map(|&i| &self.items[i])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consumes the reconciler, yielding items ready to publish.
    pub fn into_publish_queue(self) -> Vec<Item> {
        publish_order(self.items)
    }
}

/// Oldest first. The sort is stable so equal dates keep first-seen order.
pub fn publish_order(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by_key(Item::sort_key);
    items
}
