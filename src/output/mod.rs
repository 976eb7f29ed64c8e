//! Output module for crawl observations and summaries
//!
//! This module handles:
//! - The observation record produced for every fetch attempt
//! - Sinks that persist or echo observations (CSV, console, memory)
//! - The single writer task that owns a sink during a crawl
//! - Crawl statistics

mod sinks;
pub mod stats;
mod traits;
mod writer;

pub use sinks::{ConsoleSink, CsvSink, MemorySink, CSV_HEADER};
pub use stats::{print_summary, CrawlCounters, CrawlSummary};
pub use traits::{
    CrawlObservation, FetchOutcome, ObservationSink, OutputError, OutputResult,
};
pub use writer::{ObservationSender, SinkWriter};

use crate::config::OutputConfig;
use crate::SkimError;

/// Opens the sink selected by the output configuration
///
/// A configured CSV path yields a [`CsvSink`] with its header already
/// written; otherwise observations are echoed to stdout.
///
/// # Errors
///
/// Returns [`SkimError::SinkInit`] if the CSV file cannot be created.
pub fn open_sink(config: &OutputConfig) -> Result<Box<dyn ObservationSink>, SkimError> {
    match &config.csv_path {
        Some(path) => {
            let sink = CsvSink::create(path).map_err(|source| SkimError::SinkInit {
                path: path.display().to_string(),
                source,
            })?;
            tracing::info!("Writing observations to {}", path.display());
            Ok(Box::new(sink))
        }
        None => Ok(Box::new(ConsoleSink::stdout())),
    }
}

impl ObservationSink for Box<dyn ObservationSink> {
    fn record(&mut self, observation: &CrawlObservation) -> OutputResult<()> {
        (**self).record(observation)
    }

    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }
}
