//! Page fetching
//!
//! The crawl engine only needs rendered HTML for a URL; everything about how
//! that HTML is obtained sits behind the `Fetcher` trait. The production
//! implementation goes through a rendering proxy service.

mod client;

use async_trait::async_trait;

use crate::crawl::PageError;

pub use client::ProxyFetcher;

/// Retrieves the rendered HTML for a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PageError>;
}
