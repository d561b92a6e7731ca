//! promptcrawl main entry point
//!
//! Command-line interface for the prompt-driven multi-level scraper.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use promptcrawl::cache::SqliteCache;
use promptcrawl::config::{load_config_with_hash, validate, Settings};
use promptcrawl::crawl::Orchestrator;
use promptcrawl::fetch::ProxyFetcher;
use promptcrawl::providers::build_provider;
use promptcrawl::{cache::CacheStore, output};

/// promptcrawl: prompt-driven multi-level web data extraction
///
/// Give it a starting URL and a natural-language description of the data you
/// want. It crawls the listing and its pagination, follows each item's detail
/// page, and merges everything into one structured JSON result.
#[derive(Parser, Debug)]
#[command(name = "promptcrawl")]
#[command(version)]
#[command(about = "Prompt-driven multi-level web data extraction", long_about = None)]
struct Cli {
    /// Starting URL (a listing or index page)
    #[arg(value_name = "URL")]
    url: String,

    /// What to extract, in natural language; may be a path to a prompt file
    #[arg(value_name = "PROMPT")]
    prompt: String,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Extraction provider (openai, anthropic, ollama)
    #[arg(short, long)]
    provider: Option<String>,

    /// Understanding provider for dual-model mode
    #[arg(long)]
    processor: Option<String>,

    /// Fallback provider tried after the primary's retries are spent
    #[arg(long)]
    fallback: Option<String>,

    /// Maximum pages to fetch in this run
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Minimum milliseconds between fetches
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Path to the crawl cache database
    #[arg(long, value_name = "FILE")]
    cache: Option<String>,

    /// Delete all cached page results before crawling
    #[arg(long)]
    clear_cache: bool,

    /// Scroll pages to the bottom before capture (lazy-loaded listings)
    #[arg(long)]
    auto_scroll: bool,

    /// Disable JavaScript rendering at the proxy
    #[arg(long)]
    no_render: bool,

    /// Write results to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (settings, hash) =
                load_config_with_hash(path).context("failed to load configuration")?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            settings
        }
        None => Settings::default(),
    };

    apply_cli_overrides(&mut settings, &cli);
    validate(&settings).context("invalid configuration")?;

    let prompt = load_prompt(&cli.prompt)?;

    let extractor = build_provider(&settings.providers.default, &settings)?;
    let fallback = settings
        .providers
        .fallback
        .as_deref()
        .map(|name| build_provider(name, &settings))
        .transpose()?;
    let processor = settings
        .providers
        .processor
        .as_deref()
        .map(|name| build_provider(name, &settings))
        .transpose()?;

    let fetcher = Arc::new(ProxyFetcher::from_settings(&settings.fetch)?);

    let mut cache = SqliteCache::open(std::path::Path::new(&settings.cache.path))
        .context("failed to open crawl cache")?;
    if cli.clear_cache {
        cache.clear().context("failed to clear crawl cache")?;
    }

    let mut orchestrator = Orchestrator::new(
        Arc::new(settings),
        fetcher,
        extractor,
        fallback,
        processor,
        Box::new(cache),
    );

    // Ctrl-C finishes the in-flight page, then stops between URL pops so the
    // cache stays resumable.
    let stop = orchestrator.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current page then stopping");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let result = orchestrator.run(&cli.url, &prompt).await?;

    match &cli.output {
        Some(path) => output::write_to_file(&result, path)?,
        None => output::write_to_stdout(&result)?,
    }

    if !result.errors.is_empty() {
        tracing::warn!("{} URLs had recorded issues", result.errors.len());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("promptcrawl=info,warn"),
            1 => EnvFilter::new("promptcrawl=debug,info"),
            2 => EnvFilter::new("promptcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// CLI flags override whatever the config file provided
fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(provider) = &cli.provider {
        settings.providers.default = provider.clone();
    }
    if let Some(processor) = &cli.processor {
        settings.providers.processor = Some(processor.clone());
    }
    if let Some(fallback) = &cli.fallback {
        settings.providers.fallback = Some(fallback.clone());
    }
    if let Some(max_pages) = cli.max_pages {
        settings.crawl.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        settings.crawl.delay_ms = delay;
    }
    if let Some(cache) = &cli.cache {
        settings.cache.path = cache.clone();
    }
    if cli.auto_scroll {
        settings.fetch.auto_scroll = true;
    }
    if cli.no_render {
        settings.fetch.render_js = false;
        settings.fetch.auto_scroll = false;
    }
}

/// The prompt argument may name a file; if so, its contents are the prompt
fn load_prompt(arg: &str) -> anyhow::Result<String> {
    let path = std::path::Path::new(arg);
    if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read prompt file {}", path.display()))?;
        tracing::info!("Loaded prompt from {}", path.display());
        Ok(content.trim().to_string())
    } else {
        Ok(arg.to_string())
    }
}
