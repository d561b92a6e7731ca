//! Cache database schema

use rusqlite::Connection;

/// SQL schema for the crawl cache
pub const SCHEMA_SQL: &str = r#"
-- One row per (url, level) page result
CREATE TABLE IF NOT EXISTS page_cache (
    key_hash TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    level INTEGER NOT NULL,
    result TEXT NOT NULL,
    fetched_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_cache_url ON page_cache(url);
"#;

/// Creates the cache tables if they do not exist
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
