//! Crawl orchestration - the level-by-level BFS loop
//!
//! The orchestrator drives the whole pipeline for each popped URL: cache
//! check, pacing, fetch, optional understanding pass, extraction, and routing
//! of the results. A cache hit short-circuits everything after the check.
//! Levels advance only once the current frontier is exhausted; the crawl ends
//! when advancing finds no pending URLs or the page ceiling is hit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::cache::{CacheError, CacheStore};
use crate::cleaner;
use crate::config::Settings;
use crate::crawl::frontier::Frontier;
use crate::crawl::merge::MergeEngine;
use crate::crawl::pacing::Pacer;
use crate::crawl::retry::{run_with_fallback, RetryPolicy};
use crate::crawl::types::{CrawlIssue, CrawlResult, IssueKind, LevelHint, PageError, PageResult};
use crate::fetch::Fetcher;
use crate::providers::Provider;
use crate::CrawlError;

/// Drives a multi-level crawl from a seed URL
///
/// All crawl state (frontier, visited sets, page counters, accumulated
/// items) is scoped to a single `run` call, so independent crawls can share
/// a process.
pub struct Orchestrator {
    settings: Arc<Settings>,
    fetcher: Arc<dyn Fetcher>,
    extractors: Vec<Arc<dyn Provider>>,
    processor: Option<Arc<dyn Provider>>,
    cache: Box<dyn CacheStore>,
    pacer: Mutex<Pacer>,
    policy: RetryPolicy,
    stop: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Creates an orchestrator from its collaborators
    ///
    /// `extractor` handles the extraction phase; `fallback`, when set, takes
    /// over after the primary's retry budget is spent. `processor` enables
    /// dual-model mode: it turns cleaned HTML into markdown before
    /// extraction.
    pub fn new(
        settings: Arc<Settings>,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Provider>,
        fallback: Option<Arc<dyn Provider>>,
        processor: Option<Arc<dyn Provider>>,
        cache: Box<dyn CacheStore>,
    ) -> Self {
        let mut extractors = vec![extractor];
        extractors.extend(fallback);

        let pacer = Pacer::new(Duration::from_millis(settings.crawl.delay_ms));
        let policy = RetryPolicy {
            max_retries: settings.crawl.extraction_retries,
            backoff_base: Duration::from_millis(settings.crawl.backoff_base_ms),
            backoff_cap: Duration::from_secs(30),
        };

        Self {
            settings,
            fetcher,
            extractors,
            processor,
            cache,
            pacer: Mutex::new(pacer),
            policy,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that requests a graceful stop between URL pops
    ///
    /// The in-flight page completes normally and cache/result state stays
    /// consistent and resumable.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Runs the crawl to completion and returns the aggregated result
    pub async fn run(&mut self, seed: &str, prompt: &str) -> Result<CrawlResult, CrawlError> {
        let seed_url = url::Url::parse(seed)?;
        let mut frontier = Frontier::new(seed, self.settings.crawl.max_pages);
        let mut engine = MergeEngine::new();
        let mut issues: Vec<CrawlIssue> = Vec::new();

        tracing::info!(
            "Starting crawl of {} (max {} pages, provider {})",
            seed,
            self.settings.crawl.max_pages,
            self.extractors[0].name()
        );

        'crawl: loop {
            let level = frontier.depth();
            tracing::info!(
                "Level {}: {} ({} URLs queued)",
                level,
                if level == 0 { "listing pages" } else { "detail pages" },
                frontier.queued()
            );

            loop {
                if self.stop.load(Ordering::SeqCst) {
                    tracing::info!("Stop requested, ending crawl after current level state");
                    break 'crawl;
                }
                let Some(current_url) = frontier.pop_next() else {
                    break;
                };

                tracing::debug!("Processing URL: {}", current_url);

                // Read-through cache: a hit skips pacing, fetch and all
                // model calls for this URL.
                match self.cache.get(&current_url, level) {
                    Ok(Some(cached)) => {
                        tracing::info!("Cache hit for {} (level {})", current_url, level);
                        Self::route(
                            cached.result,
                            &current_url,
                            level,
                            &seed_url,
                            &mut frontier,
                            &mut engine,
                        );
                        continue;
                    }
                    Ok(None) => {}
                    Err(err @ CacheError::Corrupt { .. }) => {
                        // Resume state is ambiguous; continuing could double
                        // charges or duplicate records.
                        return Err(err.into());
                    }
                    Err(err) => {
                        // Degrades to a miss; recorded so the user knows the
                        // run paid for pages a healthy cache would have saved.
                        tracing::warn!("Cache read failed for {}: {}", current_url, err);
                        issues.push(CrawlIssue {
                            url: current_url.clone(),
                            kind: IssueKind::Cache,
                            message: format!("cache read failed: {err}"),
                        });
                    }
                }

                frontier.record_fetch();

                let extractors = self.extractors.clone();
                let outcome = run_with_fallback(&self.policy, &extractors, |provider| {
                    self.process_page(&current_url, prompt, level, Arc::clone(provider))
                })
                .await;

                match outcome {
                    Ok(page) => {
                        if let Err(err) = self.cache.put(&current_url, level, &page) {
                            tracing::warn!("Cache write failed for {}: {}", current_url, err);
                            issues.push(CrawlIssue {
                                url: current_url.clone(),
                                kind: IssueKind::Cache,
                                message: format!("cache write failed: {err}"),
                            });
                        }
                        Self::route(
                            page,
                            &current_url,
                            level,
                            &seed_url,
                            &mut frontier,
                            &mut engine,
                        );
                        tracing::info!(
                            "Progress: {} items | {} pages fetched | {} queued",
                            engine.len(),
                            frontier.pages_fetched(),
                            frontier.queued()
                        );
                    }
                    Err(err) => {
                        tracing::error!("Giving up on {}: {}", current_url, err);
                        issues.push(CrawlIssue {
                            url: current_url.clone(),
                            kind: err.kind(),
                            message: err.to_string(),
                        });
                    }
                }
            }

            if !frontier.advance_level() {
                break;
            }
        }

        let pages_crawled = frontier.pages_fetched();
        let (data, warnings) = engine.finalize();
        issues.extend(warnings);

        tracing::info!(
            "Crawl complete: {} pages fetched, {} items, {} issues",
            pages_crawled,
            data.len(),
            issues.len()
        );

        Ok(CrawlResult {
            url: seed.to_string(),
            prompt: prompt.to_string(),
            provider: self.extractors[0].name().to_string(),
            pages_crawled,
            data,
            errors: issues,
        })
    }

    /// The full fetch → understand → extract pipeline for one URL
    ///
    /// Runs under the retry/fallback controller, so a transient failure
    /// anywhere in here re-runs the whole pipeline (including a fresh,
    /// re-paced fetch) on the next attempt.
    async fn process_page(
        &self,
        url: &str,
        prompt: &str,
        level: u32,
        extractor: Arc<dyn Provider>,
    ) -> Result<PageResult, PageError> {
        self.pacer.lock().await.wait_if_needed().await;
        let raw = self.fetcher.fetch(url).await?;
        self.pacer.lock().await.record_fetch();

        let cleaned = cleaner::clean_html(&raw);
        tracing::debug!(
            "Cleaned {} -> {} bytes for {}",
            raw.len(),
            cleaned.len(),
            url
        );

        let content = match &self.processor {
            Some(processor) => match self.understand(processor, &cleaned, url).await {
                Ok(markdown) => markdown,
                Err(err) => {
                    // Dual-model mode degrades to cleaned HTML rather than
                    // losing the page.
                    tracing::warn!("Understanding failed for {}: {}, using cleaned HTML", url, err);
                    cleaned
                }
            },
            None => cleaned,
        };

        let hint = LevelHint::for_depth(level);
        let chunks = cleaner::chunk_text(&content, extractor.max_chunk_chars());
        if chunks.len() > 1 {
            tracing::info!("Extracting {} in {} chunks", url, chunks.len());
        }

        let mut page = PageResult::default();
        for chunk in &chunks {
            let result = extractor.extract(chunk, prompt, url, hint).await?;
            page.extend(result);
        }
        page.normalize();

        tracing::info!(
            "Extracted {} items, {} pagination, {} detail URLs from {}",
            page.items.len(),
            page.next_urls.len(),
            page.detail_urls.len(),
            url
        );
        Ok(page)
    }

    /// Runs the understanding pass over the cleaned HTML, chunk by chunk
    async fn understand(
        &self,
        processor: &Arc<dyn Provider>,
        cleaned: &str,
        url: &str,
    ) -> Result<String, PageError> {
        let chunks = cleaner::chunk_text(cleaned, processor.max_chunk_chars());
        let mut parts = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            tracing::debug!("Understanding chunk {}/{} of {}", i + 1, chunks.len(), url);
            parts.push(processor.understand(chunk, url).await?);
        }
        Ok(parts.join("\n\n"))
    }

    /// Routes a page result into the frontier and the merge engine
    ///
    /// Off-domain URLs are dropped; pagination extends the current level and
    /// detail URLs queue for the next. Level-0 items go through same-level
    /// dedup, deeper items merge into their parents.
    fn route(
        page: PageResult,
        source_url: &str,
        level: u32,
        seed_url: &url::Url,
        frontier: &mut Frontier,
        engine: &mut MergeEngine,
    ) {
        for item in page.items {
            if level == 0 {
                engine.add_item(item, level);
            } else {
                engine.merge_detail(item, source_url);
            }
        }

        for next in &page.next_urls {
            if same_domain(next, seed_url) {
                frontier.enqueue_same_level(next);
            } else {
                tracing::debug!("Skipping off-domain pagination URL: {}", next);
            }
        }
        for detail in &page.detail_urls {
            if same_domain(detail, seed_url) {
                frontier.enqueue_next_level(detail);
            } else {
                tracing::debug!("Skipping off-domain detail URL: {}", detail);
            }
        }
    }
}

/// True when `candidate` shares the seed's host (scheme and path ignored)
fn same_domain(candidate: &str, seed: &url::Url) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => parsed.host_str() == seed.host_str(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_domain() {
        let seed = url::Url::parse("https://example.com/listings").unwrap();
        assert!(same_domain("https://example.com/item/1", &seed));
        assert!(same_domain("http://example.com/item/1", &seed));
        assert!(!same_domain("https://other.com/item/1", &seed));
        assert!(!same_domain("https://sub.example.com/item/1", &seed));
        assert!(!same_domain("not-a-url", &seed));
    }
}
