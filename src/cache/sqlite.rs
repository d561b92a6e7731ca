//! SQLite cache implementation

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use crate::cache::schema::initialize_schema;
use crate::cache::traits::{CacheError, CacheResult, CacheStore, CachedPage};
use crate::crawl::PageResult;

/// SQLite-backed crawl cache
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Opens or creates a cache database at the given path
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory cache (for testing)
    pub fn open_in_memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Number of persisted entries
    pub fn len(&self) -> CacheResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM page_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// First 16 hex chars of SHA-256 over "url|level"
fn cache_key(url: &str, level: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"|");
    hasher.update(level.to_string().as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

impl CacheStore for SqliteCache {
    fn get(&self, url: &str, level: u32) -> CacheResult<Option<CachedPage>> {
        let key = cache_key(url, level);
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT result, fetched_at FROM page_cache WHERE key_hash = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((result_json, fetched_str)) = row else {
            return Ok(None);
        };

        let result: PageResult =
            serde_json::from_str(&result_json).map_err(|e| CacheError::Corrupt {
                url: url.to_string(),
                level,
                message: e.to_string(),
            })?;
        let fetched_at = fetched_str
            .parse::<DateTime<Utc>>()
            .map_err(|e| CacheError::Corrupt {
                url: url.to_string(),
                level,
                message: e.to_string(),
            })?;

        Ok(Some(CachedPage { result, fetched_at }))
    }

    fn put(&mut self, url: &str, level: u32, result: &PageResult) -> CacheResult<()> {
        let key = cache_key(url, level);
        let result_json = serde_json::to_string(result).map_err(|e| CacheError::Corrupt {
            url: url.to_string(),
            level,
            message: e.to_string(),
        })?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT OR REPLACE INTO page_cache (key_hash, url, level, result, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![key, url, level, result_json, now],
        )?;
        tracing::debug!("Cached result for {} (level {})", url, level);
        Ok(())
    }

    fn clear(&mut self) -> CacheResult<()> {
        self.conn.execute("DELETE FROM page_cache", [])?;
        tracing::info!("Cache cleared");
        Ok(())
    }
}
