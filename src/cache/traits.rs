//! Cache trait and error types

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::crawl::PageResult;

/// Errors that can occur during cache operations
///
/// I/O and database failures degrade to a cache miss at the call site. A
/// `Corrupt` entry is the exception: it makes a resumed run's state
/// ambiguous and aborts the crawl.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry for {url} (level {level}): {message}")]
    Corrupt {
        url: String,
        level: u32,
        message: String,
    },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// A cached page result with its fetch timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub result: PageResult,
    pub fetched_at: DateTime<Utc>,
}

/// Keyed persistence for per-page crawl results
///
/// Keys combine the URL with the crawl level, so the same URL visited with
/// listing semantics and detail semantics never collides.
pub trait CacheStore: Send {
    /// Looks up the result previously computed for (url, level)
    fn get(&self, url: &str, level: u32) -> CacheResult<Option<CachedPage>>;

    /// Stores the result of a fully processed page
    fn put(&mut self, url: &str, level: u32, result: &PageResult) -> CacheResult<()>;

    /// Removes every persisted entry
    ///
    /// Destructive and unconditional; never touches in-memory crawl state.
    fn clear(&mut self) -> CacheResult<()>;
}
