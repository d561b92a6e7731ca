//! Provider trait

use async_trait::async_trait;

use crate::crawl::{LevelHint, PageError, PageResult};

/// Default content chunk size, roughly 12k tokens at ~4 chars per token
pub const DEFAULT_CHUNK_CHARS: usize = 48_000;

/// An AI model backend used for the understanding and extraction phases
///
/// One provider instance is bound to one model. The same trait covers both
/// phases so a single backend can serve as extractor, fallback extractor, or
/// dual-model processor interchangeably.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name used in logs and the final result ("openai", "ollama", ...)
    fn name(&self) -> &'static str;

    /// Largest content chunk this provider's context window accepts
    fn max_chunk_chars(&self) -> usize {
        DEFAULT_CHUNK_CHARS
    }

    /// Converts cleaned HTML into structured markdown (dual-model mode)
    async fn understand(&self, content: &str, page_url: &str) -> Result<String, PageError>;

    /// Extracts records and crawl URLs from page content per the user prompt
    async fn extract(
        &self,
        content: &str,
        prompt: &str,
        page_url: &str,
        hint: LevelHint,
    ) -> Result<PageResult, PageError>;
}
