//! Core data types for the crawl pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An extracted record with no fixed schema
///
/// The shape is entirely prompt-defined, so items are open, insertion-ordered
/// key/value maps. By convention an item may carry a `detail_url` field which
/// acts as the join key for cross-level merging.
pub type Item = serde_json::Map<String, serde_json::Value>;

/// Key an item's fields are joined on during dedup and merge
pub const DETAIL_URL_KEY: &str = "detail_url";

/// What the extraction provider returns for each page it analyzes
///
/// The AI wire format names the items field `data`; that name is kept on the
/// wire (and in the cache) for compatibility with the extraction contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Extracted records matching the user's prompt, one per item on the page
    #[serde(rename = "data", default)]
    pub items: Vec<Item>,

    /// Pagination URLs continuing the current level
    #[serde(default)]
    pub next_urls: Vec<String>,

    /// Detail/item page URLs for the next level
    #[serde(default)]
    pub detail_urls: Vec<String>,

    /// Free-form note about what was found on this page
    #[serde(default)]
    pub summary: String,
}

impl PageResult {
    /// Appends another page result (used when a page is extracted in chunks)
    pub fn extend(&mut self, other: PageResult) {
        self.items.extend(other.items);
        self.next_urls.extend(other.next_urls);
        self.detail_urls.extend(other.detail_urls);
        if self.summary.is_empty() {
            self.summary = other.summary;
        }
    }

    /// Dedups items, next_urls and detail_urls within this single page result
    ///
    /// Order is preserved; the first occurrence wins. Items are compared by
    /// their `detail_url` field when present, by full value otherwise.
    pub fn normalize(&mut self) {
        let mut seen_keys = std::collections::HashSet::new();
        let mut kept: Vec<Item> = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            match item.get(DETAIL_URL_KEY).and_then(|v| v.as_str()) {
                Some(key) => {
                    if seen_keys.insert(key.to_string()) {
                        kept.push(item);
                    }
                }
                None => {
                    if !kept.contains(&item) {
                        kept.push(item);
                    }
                }
            }
        }
        self.items = kept;

        dedup_preserving_order(&mut self.next_urls);
        dedup_preserving_order(&mut self.detail_urls);
    }
}

fn dedup_preserving_order(urls: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    urls.retain(|u| seen.insert(u.clone()));
}

/// Tells the extraction provider whether it is looking at a listing page or
/// an item detail page, so it follows the right part of the user's prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelHint {
    /// Depth 0: the seed page and its pagination
    Listing,
    /// Depth 1+: per-item detail pages
    Detail,
}

impl LevelHint {
    pub fn for_depth(depth: u32) -> Self {
        if depth == 0 {
            Self::Listing
        } else {
            Self::Detail
        }
    }
}

/// A non-fatal failure recorded against a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlIssue {
    pub url: String,
    pub kind: IssueKind,
    pub message: String,
}

/// Kind tag for recorded issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Fetch,
    Extraction,
    MergeWarning,
    Cache,
}

/// Final aggregated output from a crawl session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Starting URL
    pub url: String,

    /// The user's natural language prompt
    pub prompt: String,

    /// Extraction provider used
    pub provider: String,

    /// Number of pages that required a fetch (cache hits excluded)
    pub pages_crawled: u32,

    /// All extracted records, merged and in discovery order
    pub data: Vec<Item>,

    /// Per-URL failures and merge warnings encountered along the way
    pub errors: Vec<CrawlIssue>,
}

/// Failure of a single page's processing pipeline
///
/// Classification into retryable vs terminal is carried as an explicit tag
/// rather than inferred from the error type, so the retry controller is plain
/// control flow.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    #[error("fetch failed: {message}")]
    Fetch { message: String, transient: bool },

    #[error("extraction failed: {message}")]
    Extraction { message: String, transient: bool },
}

impl PageError {
    /// Transient failures are retried with backoff on the same provider
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { transient, .. } => *transient,
            Self::Extraction { transient, .. } => *transient,
        }
    }

    /// Malformed model output always retries before any fallback swap
    pub fn malformed_output(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
            transient: true,
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            Self::Fetch { .. } => IssueKind::Fetch,
            Self::Extraction { .. } => IssueKind::Extraction,
        }
    }
}
