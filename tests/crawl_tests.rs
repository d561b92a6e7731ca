//! End-to-end orchestration tests with deterministic in-process collaborators

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;

use promptcrawl::cache::{CacheError, CacheResult, CacheStore, CachedPage, SqliteCache};
use promptcrawl::config::Settings;
use promptcrawl::crawl::{IssueKind, Item, LevelHint, Orchestrator, PageError, PageResult};
use promptcrawl::fetch::Fetcher;
use promptcrawl::providers::Provider;

/// Serves canned HTML keyed by URL and counts every fetch
struct FakeFetcher {
    pages: HashMap<String, String>,
    calls: Arc<AtomicUsize>,
}

impl FakeFetcher {
    fn new(urls: &[&str]) -> Self {
        let pages = urls
            .iter()
            .map(|u| (u.to_string(), format!("<html><body>{u}</body></html>")))
            .collect();
        Self {
            pages,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| PageError::Fetch {
            message: format!("no such page: {url}"),
            transient: false,
        })
    }
}

/// Returns a scripted extraction per URL and counts every extract call
struct ScriptedProvider {
    name: &'static str,
    script: HashMap<String, PageResult>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    fn new(name: &'static str, script: Vec<(&str, PageResult)>) -> Self {
        Self {
            name,
            script: script
                .into_iter()
                .map(|(url, page)| (url.to_string(), page))
                .collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn understand(&self, content: &str, _page_url: &str) -> Result<String, PageError> {
        Ok(content.to_string())
    }

    async fn extract(
        &self,
        _content: &str,
        _prompt: &str,
        page_url: &str,
        _hint: LevelHint,
    ) -> Result<PageResult, PageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .get(page_url)
            .cloned()
            .ok_or_else(|| PageError::Extraction {
                message: format!("no script for {page_url}"),
                transient: false,
            })
    }
}

/// Always fails with a transient error, counting attempts
struct BrokenProvider {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Provider for BrokenProvider {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn understand(&self, _content: &str, _page_url: &str) -> Result<String, PageError> {
        Err(PageError::Extraction {
            message: "model unavailable".to_string(),
            transient: true,
        })
    }

    async fn extract(
        &self,
        _content: &str,
        _prompt: &str,
        _page_url: &str,
        _hint: LevelHint,
    ) -> Result<PageResult, PageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PageError::Extraction {
            message: "model unavailable".to_string(),
            transient: true,
        })
    }
}

/// Delegates to a scripted provider, then raises the crawl's stop flag
struct StoppingProvider {
    inner: ScriptedProvider,
    stop: OnceLock<Arc<AtomicBool>>,
}

#[async_trait]
impl Provider for StoppingProvider {
    fn name(&self) -> &'static str {
        "stopping"
    }

    async fn understand(&self, content: &str, page_url: &str) -> Result<String, PageError> {
        self.inner.understand(content, page_url).await
    }

    async fn extract(
        &self,
        content: &str,
        prompt: &str,
        page_url: &str,
        hint: LevelHint,
    ) -> Result<PageResult, PageError> {
        let result = self.inner.extract(content, prompt, page_url, hint).await;
        if let Some(stop) = self.stop.get() {
            stop.store(true, Ordering::SeqCst);
        }
        result
    }
}

/// Every read and write fails with an I/O error
struct FailingCache;

impl CacheStore for FailingCache {
    fn get(&self, _url: &str, _level: u32) -> CacheResult<Option<CachedPage>> {
        Err(CacheError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable")))
    }

    fn put(&mut self, _url: &str, _level: u32, _result: &PageResult) -> CacheResult<()> {
        Err(CacheError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable")))
    }

    fn clear(&mut self) -> CacheResult<()> {
        Ok(())
    }
}

fn item(value: serde_json::Value) -> Item {
    value.as_object().cloned().unwrap()
}

fn page(items: Vec<serde_json::Value>, next: &[&str], detail: &[&str]) -> PageResult {
    PageResult {
        items: items.into_iter().map(item).collect(),
        next_urls: next.iter().map(|s| s.to_string()).collect(),
        detail_urls: detail.iter().map(|s| s.to_string()).collect(),
        summary: String::new(),
    }
}

/// Fast settings for deterministic tests
fn test_settings(max_pages: u32) -> Arc<Settings> {
    let mut settings = Settings::default();
    settings.crawl.max_pages = max_pages;
    settings.crawl.delay_ms = 0;
    settings.crawl.backoff_base_ms = 0;
    settings.crawl.extraction_retries = 2;
    Arc::new(settings)
}

fn cache_at(dir: &tempfile::TempDir) -> Box<dyn CacheStore> {
    Box::new(SqliteCache::open(&dir.path().join("cache.db")).unwrap())
}

/// The canonical two-level scenario: a listing with a duplicated item and a
/// pagination page, then two detail pages whose fields merge back in.
fn listing_scenario() -> Vec<(&'static str, PageResult)> {
    vec![
        (
            "https://site.test/list",
            page(
                vec![
                    json!({"name": "car1", "detail_url": "https://site.test/a"}),
                    json!({"name": "car1", "detail_url": "https://site.test/a"}),
                    json!({"name": "car2", "detail_url": "https://site.test/b"}),
                ],
                &["https://site.test/list?page=2"],
                &["https://site.test/a"],
            ),
        ),
        (
            "https://site.test/list?page=2",
            page(vec![], &[], &["https://site.test/b"]),
        ),
        (
            "https://site.test/a",
            page(
                vec![json!({"detail_url": "https://site.test/a", "vin": "VIN-1"})],
                &[],
                &[],
            ),
        ),
        (
            "https://site.test/b",
            page(
                vec![json!({"detail_url": "https://site.test/b", "vin": "VIN-2"})],
                &[],
                &[],
            ),
        ),
    ]
}

const SCENARIO_URLS: &[&str] = &[
    "https://site.test/list",
    "https://site.test/list?page=2",
    "https://site.test/a",
    "https://site.test/b",
];

#[tokio::test]
async fn two_level_crawl_dedups_and_merges() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
    let provider = Arc::new(ScriptedProvider::new("scripted", listing_scenario()));

    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher.clone(),
        provider,
        None,
        None,
        cache_at(&dir),
    );

    let result = orchestrator
        .run("https://site.test/list", "all cars with vins")
        .await
        .unwrap();

    // Duplicate car1 collapsed; both survivors enriched with their vin.
    assert_eq!(result.data.len(), 2);
    assert_eq!(result.data[0]["name"], json!("car1"));
    assert_eq!(result.data[0]["vin"], json!("VIN-1"));
    assert_eq!(result.data[1]["name"], json!("car2"));
    assert_eq!(result.data[1]["vin"], json!("VIN-2"));

    assert_eq!(result.pages_crawled, 4);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn page_ceiling_bounds_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
    let provider = Arc::new(ScriptedProvider::new("scripted", listing_scenario()));

    let mut orchestrator = Orchestrator::new(
        test_settings(2),
        fetcher.clone(),
        provider,
        None,
        None,
        cache_at(&dir),
    );

    let result = orchestrator
        .run("https://site.test/list", "all cars")
        .await
        .unwrap();

    assert_eq!(result.pages_crawled, 2);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn resumed_run_issues_no_collaborator_calls() {
    let dir = tempfile::tempdir().unwrap();

    let first = {
        let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
        let provider = Arc::new(ScriptedProvider::new("scripted", listing_scenario()));
        let mut orchestrator = Orchestrator::new(
            test_settings(20),
            fetcher,
            provider,
            None,
            None,
            cache_at(&dir),
        );
        orchestrator
            .run("https://site.test/list", "all cars")
            .await
            .unwrap()
    };

    // Same seed against the same cache: every page is a hit.
    let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
    let provider = Arc::new(ScriptedProvider::new("scripted", listing_scenario()));
    let fetch_calls = Arc::clone(&fetcher.calls);
    let extract_calls = Arc::clone(&provider.calls);

    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher,
        provider,
        None,
        None,
        cache_at(&dir),
    );
    let second = orchestrator
        .run("https://site.test/list", "all cars")
        .await
        .unwrap();

    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(extract_calls.load(Ordering::SeqCst), 0);
    assert_eq!(second.pages_crawled, 0);
    assert_eq!(second.data, first.data);
}

#[tokio::test]
async fn fallback_takes_over_after_retries_and_result_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::new(&["https://site.test/list"]));
    let broken = Arc::new(BrokenProvider {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let fallback = Arc::new(ScriptedProvider::new(
        "scripted",
        vec![(
            "https://site.test/list",
            page(vec![json!({"name": "only"})], &[], &[]),
        )],
    ));

    let broken_calls = Arc::clone(&broken.calls);
    let fallback_calls = Arc::clone(&fallback.calls);

    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher,
        broken,
        Some(fallback),
        None,
        cache_at(&dir),
    );
    let result = orchestrator
        .run("https://site.test/list", "anything")
        .await
        .unwrap();

    // Primary gets its initial attempt plus two retries, fallback once.
    assert_eq!(broken_calls.load(Ordering::SeqCst), 3);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.data.len(), 1);
    assert!(result.errors.is_empty());

    // The fallback's result landed in the cache.
    let cache = SqliteCache::open(&dir.path().join("cache.db")).unwrap();
    let cached = cache.get("https://site.test/list", 0).unwrap().unwrap();
    assert_eq!(cached.result.items.len(), 1);
}

#[tokio::test]
async fn failed_page_is_recorded_and_crawl_continues() {
    let dir = tempfile::tempdir().unwrap();
    // The detail page /gone is never served by the fetcher.
    let fetcher = Arc::new(FakeFetcher::new(&["https://site.test/list"]));
    let provider = Arc::new(ScriptedProvider::new(
        "scripted",
        vec![(
            "https://site.test/list",
            page(
                vec![json!({"name": "x", "detail_url": "https://site.test/gone"})],
                &[],
                &["https://site.test/gone"],
            ),
        )],
    ));

    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher,
        provider,
        None,
        None,
        cache_at(&dir),
    );
    let result = orchestrator
        .run("https://site.test/list", "anything")
        .await
        .unwrap();

    assert_eq!(result.data.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, "https://site.test/gone");
    assert_eq!(result.errors[0].kind, IssueKind::Fetch);
}

#[tokio::test]
async fn cached_pages_skip_the_pacing_delay() {
    let dir = tempfile::tempdir().unwrap();

    {
        let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
        let provider = Arc::new(ScriptedProvider::new("scripted", listing_scenario()));
        let mut orchestrator = Orchestrator::new(
            test_settings(20),
            fetcher,
            provider,
            None,
            None,
            cache_at(&dir),
        );
        orchestrator
            .run("https://site.test/list", "all cars")
            .await
            .unwrap();
    }

    // Rerun with a delay long enough that even one pacer wait would show:
    // four cache hits must not wait four intervals, or any at all.
    let mut settings = Settings::default();
    settings.crawl.max_pages = 20;
    settings.crawl.delay_ms = 5_000;
    settings.crawl.backoff_base_ms = 0;

    let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
    let provider = Arc::new(ScriptedProvider::new("scripted", listing_scenario()));
    let mut orchestrator = Orchestrator::new(
        Arc::new(settings),
        fetcher,
        provider,
        None,
        None,
        cache_at(&dir),
    );

    let start = Instant::now();
    let result = orchestrator
        .run("https://site.test/list", "all cars")
        .await
        .unwrap();

    assert_eq!(result.pages_crawled, 0);
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "cached run took {:?}, cache hits must not be paced",
        start.elapsed()
    );
}

#[tokio::test]
async fn stop_flag_halts_between_pages_and_leaves_cache_resumable() {
    let dir = tempfile::tempdir().unwrap();

    let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
    let provider = Arc::new(StoppingProvider {
        inner: ScriptedProvider::new("scripted", listing_scenario()),
        stop: OnceLock::new(),
    });
    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher,
        Arc::clone(&provider) as Arc<dyn Provider>,
        None,
        None,
        cache_at(&dir),
    );
    provider.stop.set(orchestrator.stop_flag()).unwrap();

    // The stop raised during the first extraction is honored before the
    // next pop: the in-flight page completes, nothing else starts.
    let partial = orchestrator
        .run("https://site.test/list", "all cars")
        .await
        .unwrap();

    assert_eq!(partial.pages_crawled, 1);
    assert_eq!(partial.data.len(), 2);
    assert!(partial.data.iter().all(|item| !item.contains_key("vin")));
    assert!(partial.errors.is_empty());

    // Resume against the same cache: the completed page is a hit, the
    // remaining three pages are fetched fresh.
    let fetcher = Arc::new(FakeFetcher::new(SCENARIO_URLS));
    let provider = Arc::new(ScriptedProvider::new("scripted", listing_scenario()));
    let fetch_calls = Arc::clone(&fetcher.calls);

    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher,
        provider,
        None,
        None,
        cache_at(&dir),
    );
    let full = orchestrator
        .run("https://site.test/list", "all cars")
        .await
        .unwrap();

    assert_eq!(full.pages_crawled, 3);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 3);
    assert_eq!(full.data.len(), 2);
    assert_eq!(full.data[0]["vin"], json!("VIN-1"));
    assert_eq!(full.data[1]["vin"], json!("VIN-2"));
}

#[tokio::test]
async fn cache_io_failures_degrade_to_miss_and_are_recorded() {
    let fetcher = Arc::new(FakeFetcher::new(&["https://site.test/list"]));
    let provider = Arc::new(ScriptedProvider::new(
        "scripted",
        vec![(
            "https://site.test/list",
            page(vec![json!({"name": "only"})], &[], &[]),
        )],
    ));

    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher,
        provider,
        None,
        None,
        Box::new(FailingCache),
    );
    let result = orchestrator
        .run("https://site.test/list", "anything")
        .await
        .unwrap();

    // The page is still fetched and extracted despite the broken cache.
    assert_eq!(result.pages_crawled, 1);
    assert_eq!(result.data.len(), 1);

    // One failed read and one failed write, both surfaced to the user.
    assert_eq!(result.errors.len(), 2);
    assert!(result
        .errors
        .iter()
        .all(|e| e.kind == IssueKind::Cache && e.url == "https://site.test/list"));
}

#[tokio::test]
async fn off_domain_urls_are_not_followed() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(FakeFetcher::new(&["https://site.test/list"]));
    let provider = Arc::new(ScriptedProvider::new(
        "scripted",
        vec![(
            "https://site.test/list",
            page(
                vec![],
                &["https://elsewhere.test/page2"],
                &["https://elsewhere.test/item"],
            ),
        )],
    ));

    let fetch_calls = Arc::clone(&fetcher.calls);
    let mut orchestrator = Orchestrator::new(
        test_settings(20),
        fetcher,
        provider,
        None,
        None,
        cache_at(&dir),
    );
    let result = orchestrator
        .run("https://site.test/list", "anything")
        .await
        .unwrap();

    assert_eq!(result.pages_crawled, 1);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);
    assert!(result.errors.is_empty());
}
