//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives a crawl session:
//! - Seeding the frontier from the configured URL
//! - Running a fixed pool of workers over a shared work queue
//! - Fetching pages under the governor and recording one observation each
//! - Extracting links (statically, or through the render fallback) and
//!   submitting admitted children back to the queue
//! - Detecting when the frontier has drained

use crate::config::{validate, CrawlConfig};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::governor::Governor;
use crate::crawler::parser::parse_html;
use crate::crawler::render::{ChromiumRenderer, LinkRenderer};
use crate::crawler::{build_http_client, fetch_url, FetchError, FetchResult};
use crate::output::{
    open_sink, CrawlCounters, CrawlObservation, CrawlSummary, FetchOutcome, ObservationSender,
    ObservationSink, SinkWriter,
};
use crate::url::{normalize_url, resolve_href, ScopeFilter};
use crate::{SkimError, UrlError};
use chrono::Utc;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<CrawlConfig>,
    seed: Url,
    scope: ScopeFilter,
    client: Client,
    renderer: Option<Arc<dyn LinkRenderer>>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Seed and HTTP client are usable
    /// * `Err(SkimError::InvalidSeedUrl)` - The seed cannot be normalized
    /// * `Err(SkimError::HttpClient)` - The client (e.g. its proxy) cannot be built
    pub fn new(config: CrawlConfig) -> Result<Self, SkimError> {
        let seed_str = config.crawl.seed_url.trim();
        let seed = normalize_url(seed_str).map_err(|source| SkimError::InvalidSeedUrl {
            url: seed_str.to_string(),
            source,
        })?;

        let scope = ScopeFilter::for_seed(&seed, config.crawl.scope).ok_or_else(|| {
            SkimError::InvalidSeedUrl {
                url: seed_str.to_string(),
                source: UrlError::MissingHost,
            }
        })?;

        let client = build_http_client(&config.request)?;

        Ok(Self {
            config: Arc::new(config),
            seed,
            scope,
            client,
            renderer: None,
        })
    }

    /// Enables the render fallback for pages without static links
    pub fn with_renderer(mut self, renderer: Arc<dyn LinkRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Scope predicate derived from the seed
    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }

    /// Runs the crawl, sending every observation to `observations`
    ///
    /// Returns once the frontier has drained and all workers have exited.
    /// `rows_written` in the returned summary is left at zero; see
    /// [`Coordinator::run_with_sink`].
    pub async fn run(self, observations: ObservationSender) -> Result<CrawlSummary, SkimError> {
        let start_time = Instant::now();
        let worker_count = self.config.crawl.concurrency.max(1) as usize;

        tracing::info!(
            "Starting crawl of {} (depth {}, concurrency {}, scope {} '{}')",
            self.seed,
            self.config.crawl.max_depth,
            worker_count,
            self.scope.mode(),
            self.scope.host()
        );

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Session {
            frontier: Frontier::new(self.config.crawl.max_depth),
            governor: Governor::from_config(&self.config),
            counters: CrawlCounters::new(),
            queue: Mutex::new(Some(queue_tx)),
            outstanding: AtomicUsize::new(0),
            config: self.config,
            scope: self.scope,
            client: self.client,
            renderer: self.renderer,
            observations,
        });

        if session.frontier.try_admit(&self.seed, 0) {
            session.submit(FrontierEntry::new(self.seed.clone(), 0));
        }

        let queue_rx = Arc::new(tokio::sync::Mutex::new(queue_rx));
        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let session = Arc::clone(&session);
            let queue_rx = Arc::clone(&queue_rx);
            workers.spawn(async move { session.work(worker_id, queue_rx).await });
        }

        let mut worker_failure = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    tracing::error!("Crawl worker failed: {}", e);
                    if worker_failure.is_none() {
                        worker_failure = Some(e.to_string());
                        workers.abort_all();
                    }
                }
                Ok(()) => {}
            }
        }
        if let Some(message) = worker_failure {
            return Err(SkimError::Worker(message));
        }

        let summary = session.counters.snapshot(
            self.seed.as_str(),
            session.governor.peak_in_flight(),
            start_time.elapsed(),
        );

        tracing::info!(
            "Crawl completed: {} URLs visited in {:?} ({} ok, {} HTTP errors, {} transport errors)",
            summary.observations,
            summary.elapsed,
            summary.successes,
            summary.http_errors,
            summary.transport_errors
        );

        Ok(summary)
    }

    /// Runs the crawl with a dedicated writer task owning `sink`
    ///
    /// The writer is drained before this returns, so the summary's
    /// `rows_written` is final.
    pub async fn run_with_sink<S>(self, sink: S) -> Result<CrawlSummary, SkimError>
    where
        S: ObservationSink + 'static,
    {
        let writer = SinkWriter::spawn(sink);
        let result = self.run(writer.sender()).await;
        let rows = writer.finish().await;

        let mut summary = result?;
        summary.rows_written = rows?;
        Ok(summary)
    }
}

/// Marks one entry complete when dropped, including during a panic unwind
struct Completion<'a>(&'a Session);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.complete_one();
    }
}

/// State shared by the workers of one crawl
struct Session {
    config: Arc<CrawlConfig>,
    scope: ScopeFilter,
    frontier: Frontier,
    governor: Governor,
    client: Client,
    renderer: Option<Arc<dyn LinkRenderer>>,
    counters: CrawlCounters,
    observations: ObservationSender,

    /// Taken and dropped when `outstanding` reaches zero, closing the queue
    queue: Mutex<Option<UnboundedSender<FrontierEntry>>>,

    /// Entries submitted but not yet fully processed
    outstanding: AtomicUsize,
}

impl Session {
    async fn work(
        &self,
        worker_id: usize,
        queue: Arc<tokio::sync::Mutex<UnboundedReceiver<FrontierEntry>>>,
    ) {
        loop {
            let next = queue.lock().await.recv().await;
            let Some(entry) = next else {
                break;
            };

            let _completion = Completion(self);
            self.process(entry).await;
        }

        tracing::trace!("Worker {} exiting", worker_id);
    }

    fn submit(&self, entry: FrontierEntry) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);

        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = queue.as_ref() {
            if tx.send(entry).is_err() {
                tracing::error!("Work queue closed while entries were outstanding");
            }
        }
    }

    fn complete_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            tracing::debug!("Frontier drained, closing work queue");
            self.queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
    }

    /// Fetches one admitted entry, records its observation, and submits its
    /// admitted children
    async fn process(&self, entry: FrontierEntry) {
        let FrontierEntry { url, depth } = entry;

        let permit = match self.governor.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                let now = Utc::now();
                self.record(CrawlObservation {
                    url: url.to_string(),
                    depth,
                    outcome: FetchOutcome::Failed(FetchError::Aborted(e.to_string())),
                    started_at: now,
                    finished_at: now,
                });
                return;
            }
        };

        self.governor.pace().await;
        let user_agent = self.governor.next_user_agent();

        let started_at = Utc::now();
        let result = fetch_url(&self.client, &url, user_agent).await;
        let finished_at = Utc::now();

        let outcome = match &result {
            FetchResult::NetworkError(error) => FetchOutcome::Failed(error.clone()),
            other => FetchOutcome::Response {
                status: other.status_code().unwrap_or_default(),
            },
        };

        self.record(CrawlObservation {
            url: url.to_string(),
            depth,
            outcome,
            started_at,
            finished_at,
        });

        let expandable = depth < self.frontier.max_depth();
        let links = match result {
            FetchResult::Page {
                final_url, body, ..
            } if expandable => self.extract_links(&url, &final_url, &body).await,
            FetchResult::ContentMismatch { content_type, .. } => {
                tracing::debug!("Not parsing {} ({})", url, content_type);
                None
            }
            _ => None,
        };

        drop(permit);

        if let Some((base, hrefs)) = links {
            self.admit_links(&base, &hrefs, depth + 1);
        }
    }

    /// Returns the base URL and raw hrefs of a fetched page
    ///
    /// Falls back to rendering when the static HTML has no anchors and a
    /// renderer is configured.
    async fn extract_links(
        &self,
        url: &Url,
        final_url: &Url,
        body: &str,
    ) -> Option<(Url, Vec<String>)> {
        let parsed = parse_html(body);
        if !parsed.hrefs.is_empty() {
            return Some((parsed.base_url(final_url), parsed.hrefs));
        }

        let renderer = self.renderer.as_ref()?;
        tracing::info!("No static links on {}, rendering with headless browser", url);

        match renderer.render_links(url).await {
            Ok(hrefs) => {
                self.counters.record_fallback(true);
                tracing::debug!("Rendered {} links from {}", hrefs.len(), url);
                Some((final_url.clone(), hrefs))
            }
            Err(e) => {
                self.counters.record_fallback(false);
                tracing::warn!("Render fallback failed for {}: {}", url, e);
                None
            }
        }
    }

    fn admit_links(&self, base: &Url, hrefs: &[String], depth: u32) {
        for href in hrefs {
            let url = match resolve_href(href, base) {
                Ok(url) => url,
                Err(e) => {
                    self.counters.record_invalid();
                    tracing::debug!("Skipping link {:?}: {}", href, e);
                    continue;
                }
            };

            if !self.scope.allows(&url) {
                self.counters.record_out_of_scope();
                tracing::debug!("Skipping out-of-scope link {}", url);
                continue;
            }

            if self.frontier.try_admit(&url, depth) {
                self.counters.record_admitted();
                self.submit(FrontierEntry::new(url, depth));
            }
        }
    }

    fn record(&self, observation: CrawlObservation) {
        match &observation.outcome {
            FetchOutcome::Failed(error) => {
                tracing::warn!("Fetch failed for {}: {}", observation.url, error)
            }
            outcome => tracing::debug!("Status {} -> {}", outcome, observation.url),
        }

        self.counters.record_outcome(&observation.outcome);

        if let Err(e) = self.observations.send(observation) {
            tracing::error!("Observation for {} dropped: writer stopped", e.0.url);
        }
    }
}

/// Runs the main crawl operation
///
/// This function orchestrates the entire crawl process:
///
/// 1. Validate the configuration
/// 2. Normalize the seed and build the HTTP client
/// 3. Open the output sink (CSV file, or console echo)
/// 4. Launch the headless browser when the fallback is enabled
/// 5. Crawl until the frontier drains
/// 6. Flush the sink and return the summary
///
/// A browser that fails to launch disables the fallback with a warning; the
/// crawl still runs.
///
/// # Example
///
/// ```no_run
/// use sumi_skim::config::load_config;
/// use sumi_skim::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("skim.toml"))?;
/// let summary = run_crawl(config).await?;
/// println!("{} URLs visited", summary.observations);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: CrawlConfig) -> Result<CrawlSummary, SkimError> {
    validate(&config)?;

    let mut coordinator = Coordinator::new(config)?;
    let sink = open_sink(&coordinator.config.output)?;

    if coordinator.config.headless.enabled {
        let user_agent = coordinator.config.request.user_agents.first().cloned();
        let launched =
            ChromiumRenderer::launch(&coordinator.config.headless, user_agent.as_deref()).await;
        match launched {
            Ok(renderer) => coordinator = coordinator.with_renderer(Arc::new(renderer)),
            Err(e) => tracing::warn!("Headless fallback disabled: {}", e),
        }
    }

    coordinator.run_with_sink(sink).await
}
