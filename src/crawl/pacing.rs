//! Minimum-interval gate between outbound fetches
//!
//! A fixed, configured delay must elapse between the completion of one fetch
//! and the start of the next. Cache hits bypass the network entirely and must
//! not touch the pacer at all.

use std::time::{Duration, Instant};

/// Enforces the configured minimum interval between fetches
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last_fetch: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fetch: None,
        }
    }

    /// Sleeps until the configured delay has elapsed since the last fetch
    ///
    /// The first call never waits.
    pub async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_fetch {
            let since = last.elapsed();
            if since < self.delay {
                let wait = self.delay - since;
                tracing::debug!("Pacing: waiting {:?} before next fetch", wait);
                tokio::time::sleep(wait).await;
            }
        }
    }

    /// Marks the completion time of a fetch
    pub fn record_fetch(&mut self) {
        self.last_fetch = Some(Instant::now());
    }
}
