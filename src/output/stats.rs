//! Crawl statistics
//!
//! Workers bump lock-free counters while the crawl runs; the coordinator
//! turns them into a [`CrawlSummary`] once the frontier has drained.

use crate::output::traits::FetchOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Summary statistics for a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Normalized seed URL
    pub seed_url: String,

    /// Observations produced (one per admitted URL)
    pub observations: u64,

    /// 2xx responses
    pub successes: u64,

    /// Responses with a non-2xx status
    pub http_errors: u64,

    /// Fetches that produced no response
    pub transport_errors: u64,

    /// Child URLs admitted to the frontier
    pub links_admitted: u64,

    /// Hrefs dropped because they could not be normalized
    pub links_invalid: u64,

    /// Hrefs dropped by the scope filter
    pub links_out_of_scope: u64,

    /// Pages rendered by the JS fallback
    pub fallback_runs: u64,

    /// JS fallback renders that failed
    pub fallback_failures: u64,

    /// Highest number of simultaneous fetches
    pub peak_in_flight: usize,

    /// Rows accepted by the sink
    pub rows_written: u64,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.observations == 0 {
            return 0.0;
        }
        (self.successes as f64 / self.observations as f64) * 100.0
    }

    /// Returns the error rate (HTTP and transport) as a percentage
    pub fn error_rate(&self) -> f64 {
        if self.observations == 0 {
            return 0.0;
        }
        ((self.http_errors + self.transport_errors) as f64 / self.observations as f64) * 100.0
    }
}

/// Counters shared by crawl workers
#[derive(Debug, Default)]
pub struct CrawlCounters {
    observations: AtomicU64,
    successes: AtomicU64,
    http_errors: AtomicU64,
    transport_errors: AtomicU64,
    links_admitted: AtomicU64,
    links_invalid: AtomicU64,
    links_out_of_scope: AtomicU64,
    fallback_runs: AtomicU64,
    fallback_failures: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_outcome(&self, outcome: &FetchOutcome) {
        self.observations.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            FetchOutcome::Failed(_) => &self.transport_errors,
            _ if outcome.is_success() => &self.successes,
            _ => &self.http_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admitted(&self) {
        self.links_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.links_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_out_of_scope(&self) {
        self.links_out_of_scope.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self, succeeded: bool) {
        self.fallback_runs.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.fallback_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Builds a summary from the current counter values
    pub fn snapshot(&self, seed_url: &str, peak_in_flight: usize, elapsed: Duration) -> CrawlSummary {
        CrawlSummary {
            seed_url: seed_url.to_string(),
            observations: self.observations.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            http_errors: self.http_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            links_admitted: self.links_admitted.load(Ordering::Relaxed),
            links_invalid: self.links_invalid.load(Ordering::Relaxed),
            links_out_of_scope: self.links_out_of_scope.load(Ordering::Relaxed),
            fallback_runs: self.fallback_runs.load(Ordering::Relaxed),
            fallback_failures: self.fallback_failures.load(Ordering::Relaxed),
            peak_in_flight,
            rows_written: 0,
            elapsed,
        }
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Seed: {}", summary.seed_url);
    println!(
        "Elapsed: {:.2}s (peak concurrency {})",
        summary.elapsed.as_secs_f64(),
        summary.peak_in_flight
    );
    println!();

    println!("Observations: {}", summary.observations);
    println!("  Successful: {}", summary.successes);
    println!("  HTTP errors: {}", summary.http_errors);
    println!("  Transport errors: {}", summary.transport_errors);
    println!();

    println!("Links:");
    println!("  Admitted: {}", summary.links_admitted);
    println!("  Out of scope: {}", summary.links_out_of_scope);
    println!("  Invalid: {}", summary.links_invalid);

    if summary.fallback_runs > 0 {
        println!();
        println!(
            "JS fallback: {} renders, {} failed",
            summary.fallback_runs, summary.fallback_failures
        );
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} URLs)",
        summary.success_rate(),
        summary.successes,
        summary.observations
    );
}
