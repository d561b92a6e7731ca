//! Multi-level crawl engine
//!
//! A crawl is a breadth-first walk over levels: level 0 is the seed listing
//! page plus its pagination, deeper levels are the detail pages discovered
//! one level up. The orchestrator owns the loop; frontier, merge, pacing and
//! retry are its separable pieces.

mod frontier;
mod merge;
mod orchestrator;
mod pacing;
mod retry;
mod types;

pub use frontier::Frontier;
pub use merge::MergeEngine;
pub use orchestrator::Orchestrator;
pub use pacing::Pacer;
pub use retry::{run_with_fallback, RetryPolicy};
pub use types::{
    CrawlIssue, CrawlResult, IssueKind, Item, LevelHint, PageError, PageResult, DETAIL_URL_KEY,
};
