//! Concurrency governor for fetch admission
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Tracking of in-flight and peak concurrent fetches
//! - Randomized pre-fetch pacing delays
//! - User-agent rotation

use crate::config::CrawlConfig;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// A held unit of fetch capacity
///
/// Dropping the permit returns the unit to the governor, whatever path the
/// worker leaves by.
#[derive(Debug)]
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for FetchPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Governor limits simultaneous fetches and paces requests
///
/// The governor coordinates:
/// - Global concurrency limits (at most `capacity` permits held)
/// - Randomized delays between `min_delay` and `max_delay` before each fetch
/// - Round-robin selection from a pool of user-agent strings
#[derive(Debug)]
pub struct Governor {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak: AtomicUsize,

    min_delay: Duration,
    max_delay: Duration,

    user_agents: Vec<String>,
    next_agent: AtomicUsize,
}

impl Governor {
    /// Creates a governor with `capacity` permits, no pacing, and no user agents
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: AtomicUsize::new(0),
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            user_agents: Vec::new(),
            next_agent: AtomicUsize::new(0),
        }
    }

    /// Creates a governor from the crawl configuration
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.crawl.concurrency as usize)
            .with_pacing(config.request.min_delay(), config.request.max_delay())
            .with_user_agents(config.request.user_agents.clone())
    }

    /// Sets the pacing bounds; `max` is raised to `min` if smaller
    pub fn with_pacing(mut self, min: Duration, max: Duration) -> Self {
        self.min_delay = min;
        self.max_delay = max.max(min);
        self
    }

    /// Sets the user-agent rotation pool
    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.user_agents = user_agents;
        self
    }

    /// Waits for a unit of fetch capacity
    ///
    /// # Errors
    ///
    /// Fails only if the underlying semaphore has been closed.
    pub async fn acquire(&self) -> Result<FetchPermit, AcquireError> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        Ok(FetchPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Picks the next pacing delay, uniformly within the configured bounds
    pub fn pacing_delay(&self) -> Duration {
        if self.max_delay.is_zero() {
            return Duration::ZERO;
        }
        if self.min_delay == self.max_delay {
            return self.min_delay;
        }

        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Sleeps for a pacing delay and returns how long it slept
    pub async fn pace(&self) -> Duration {
        let delay = self.pacing_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }

    /// Returns the next user agent in rotation, if any are configured
    pub fn next_user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        self.user_agents.get(index).map(String::as_str)
    }

    /// Maximum number of simultaneous fetches
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of permits currently available
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
