//! Single-writer task feeding an observation sink
//!
//! Workers send observations over an unbounded channel; one blocking task owns
//! the sink and writes them in arrival order, so rows never interleave.

use crate::output::traits::{CrawlObservation, ObservationSink, OutputError, OutputResult};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

/// Sending half handed to crawl workers
pub type ObservationSender = UnboundedSender<CrawlObservation>;

/// Owns the writer task for one sink
pub struct SinkWriter {
    tx: ObservationSender,
    task: JoinHandle<OutputResult<u64>>,
}

impl SinkWriter {
    /// Starts the writer task for `sink`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(mut sink: S) -> Self
    where
        S: ObservationSink + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<CrawlObservation>();

        let task = tokio::task::spawn_blocking(move || {
            let mut rows = 0u64;
            let mut first_error: Option<OutputError> = None;

            while let Some(observation) = rx.blocking_recv() {
                match sink.record(&observation) {
                    Ok(()) => rows += 1,
                    Err(e) => {
                        tracing::error!("Failed to record {}: {}", observation.url, e);
                        first_error.get_or_insert(e);
                    }
                }
            }

            sink.finish()?;

            match first_error {
                Some(e) => Err(e),
                None => Ok(rows),
            }
        });

        Self { tx, task }
    }

    /// Returns a sender for workers
    pub fn sender(&self) -> ObservationSender {
        self.tx.clone()
    }

    /// Closes this writer's sender, waits for queued observations to be
    /// written, and returns the number of rows written
    ///
    /// Observations still held by other senders are written before this
    /// returns, so every sender must be dropped first.
    pub async fn finish(self) -> OutputResult<u64> {
        drop(self.tx);
        self.task
            .await
            .map_err(|e| OutputError::WriterStopped(e.to_string()))?
    }
}
