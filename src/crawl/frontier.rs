//! Frontier management for the level-by-level BFS traversal
//!
//! The frontier keeps two queues: the active queue for the current depth
//! (listing pages and their pagination) and a pending queue for the next
//! depth (detail pages discovered along the way). Same-level URLs extend the
//! current breadth-first sweep; next-level URLs stay invisible until the
//! current level is exhausted and the frontier advances.

use std::collections::{HashSet, VecDeque};

/// Per-level work queues with a global fetch ceiling
#[derive(Debug)]
pub struct Frontier {
    /// URLs pending at the current depth, in discovery order
    current: VecDeque<String>,

    /// URLs queued for the next depth, promoted by `advance_level`
    pending: Vec<String>,

    /// Every URL enqueued at the current depth (exact string match)
    visited: HashSet<String>,

    /// Dedup set for the pending queue
    pending_seen: HashSet<String>,

    depth: u32,
    fetches: u32,
    max_pages: u32,
}

impl Frontier {
    /// Creates a frontier at depth 0 with the seed URL as sole entry
    pub fn new(seed: &str, max_pages: u32) -> Self {
        let mut frontier = Self {
            current: VecDeque::new(),
            pending: Vec::new(),
            visited: HashSet::new(),
            pending_seen: HashSet::new(),
            depth: 0,
            fetches: 0,
            max_pages,
        };
        frontier.enqueue_same_level(seed);
        frontier
    }

    /// Appends a pagination URL to the current level's queue
    ///
    /// A URL already seen at this level is silently dropped.
    pub fn enqueue_same_level(&mut self, url: &str) {
        if self.visited.insert(url.to_string()) {
            self.current.push_back(url.to_string());
        }
    }

    /// Queues a detail URL for the next level
    ///
    /// Invisible to the current level's pop cycle; duplicates are dropped.
    pub fn enqueue_next_level(&mut self, url: &str) {
        if self.pending_seen.insert(url.to_string()) {
            self.pending.push(url.to_string());
        }
    }

    /// Pops the next URL at the current depth
    ///
    /// Returns `None` when the level is exhausted, or unconditionally once
    /// the fetch counter has reached the configured page ceiling (a soft
    /// stop, not an error).
    pub fn pop_next(&mut self) -> Option<String> {
        if self.fetches >= self.max_pages {
            if !self.current.is_empty() {
                tracing::info!(
                    "Page ceiling of {} reached with {} URLs still queued",
                    self.max_pages,
                    self.current.len()
                );
                self.current.clear();
            }
            return None;
        }
        self.current.pop_front()
    }

    /// True once the current level has no URLs left to pop
    pub fn level_exhausted(&self) -> bool {
        self.current.is_empty()
    }

    /// Promotes the pending next-level queue to the active queue
    ///
    /// Only valid when the current level is exhausted. Returns false when no
    /// pending URLs exist: the crawl is over.
    pub fn advance_level(&mut self) -> bool {
        debug_assert!(self.level_exhausted());
        if self.pending.is_empty() {
            return false;
        }

        self.depth += 1;
        self.visited = self.pending_seen.clone();
        self.current = self.pending.drain(..).collect();
        self.pending_seen.clear();

        tracing::info!(
            "Advancing to level {} with {} URLs",
            self.depth,
            self.current.len()
        );
        true
    }

    /// Counts one outbound fetch against the page ceiling
    ///
    /// Cache hits must not be counted; only call this on a cache miss.
    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    /// Current BFS depth (0 = seed level)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of fetches issued so far
    pub fn pages_fetched(&self) -> u32 {
        self.fetches
    }

    /// Number of URLs waiting at the current level
    pub fn queued(&self) -> usize {
        self.current.len()
    }
}
