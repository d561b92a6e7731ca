//! Item deduplication and cross-level merging
//!
//! Items are keyed by their `detail_url` field when present. Within a level,
//! the first occurrence of a key wins positionally and later duplicates are
//! dropped (the same item showing up on several pagination pages). Across
//! levels, a detail item's fields are folded into the parent item that shares
//! its key: field-wise union, later values win on collision.

use std::collections::{HashMap, HashSet};

use crate::crawl::types::{CrawlIssue, IssueKind, Item, DETAIL_URL_KEY};

fn item_key(item: &Item) -> Option<String> {
    item.get(DETAIL_URL_KEY)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Accumulates items across the crawl and applies dedup/merge policy
#[derive(Debug, Default)]
pub struct MergeEngine {
    items: Vec<Item>,
    by_key: HashMap<String, usize>,
    seen_at_level: HashSet<(u32, String)>,
    warnings: Vec<CrawlIssue>,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly extracted item at the given level
    ///
    /// Items without a `detail_url` have no natural key and are never
    /// deduplicated; they are kept as unique records by identity.
    pub fn add_item(&mut self, item: Item, level: u32) {
        let Some(key) = item_key(&item) else {
            self.items.push(item);
            return;
        };

        if !self.seen_at_level.insert((level, key.clone())) {
            tracing::debug!("Dropping duplicate item for {} at level {}", key, level);
            return;
        }

        if self.by_key.contains_key(&key) {
            // Same key from an earlier level: the detail merge path owns it
            return;
        }

        self.by_key.insert(key, self.items.len());
        self.items.push(item);
    }

    /// Merges a detail-level item into its parent record
    ///
    /// The join key is the incoming item's own `detail_url`, falling back to
    /// the URL of the page it was extracted from. When no parent matches, the
    /// item is appended as a new top-level record and a warning is recorded
    /// rather than dropping the data.
    pub fn merge_detail(&mut self, item: Item, source_url: &str) {
        let key = item_key(&item).unwrap_or_else(|| source_url.to_string());

        match self.by_key.get(&key) {
            Some(&idx) => {
                let parent = &mut self.items[idx];
                let new_fields: Vec<&String> =
                    item.keys().filter(|k| !parent.contains_key(*k)).collect();
                if !new_fields.is_empty() {
                    tracing::info!(
                        "Merged {} new fields into {}",
                        new_fields.len(),
                        key
                    );
                }
                for (k, v) in item {
                    parent.insert(k, v);
                }
            }
            None => {
                tracing::warn!("Detail item from {} has no matching parent", source_url);
                self.warnings.push(CrawlIssue {
                    url: source_url.to_string(),
                    kind: IssueKind::MergeWarning,
                    message: format!("detail item with key {} has no matching parent", key),
                });
                self.by_key.insert(key, self.items.len());
                self.items.push(item);
            }
        }
    }

    /// Number of items accumulated so far
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the merged item list in discovery order, plus merge warnings
    pub fn finalize(self) -> (Vec<Item>, Vec<CrawlIssue>) {
        (self.items, self.warnings)
    }
}
