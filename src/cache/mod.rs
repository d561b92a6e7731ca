//! Resumable crawl cache
//!
//! Maps (URL, level) to the page result previously computed for that key, so
//! an interrupted crawl can resume without repeating network or model calls.
//! Entries are written only after a page has been fully and successfully
//! processed; a failed page is always re-attempted on the next run.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCache;
pub use traits::{CacheError, CacheResult, CacheStore, CachedPage};
