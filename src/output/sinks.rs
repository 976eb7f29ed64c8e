//! Observation sink implementations
//!
//! - `CsvSink`: `URL,Status` rows in a CSV file
//! - `ConsoleSink`: `Status <status> -> <url>` lines, used without an output file
//! - `MemorySink`: keeps observations in memory for library callers

use crate::output::traits::{CrawlObservation, ObservationSink, OutputResult};
use std::fs::File;
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Header row of the CSV output
pub const CSV_HEADER: [&str; 2] = ["URL", "Status"];

/// Writes one CSV row per observation
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Creates (or truncates) `path` and writes the header row
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or the header cannot be written.
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps any writer and writes the header row
    pub fn from_writer(inner: W) -> OutputResult<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer })
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::output::OutputError::Write(e.to_string()))
    }
}

impl<W: Write + Send> ObservationSink for CsvSink<W> {
    fn record(&mut self, observation: &CrawlObservation) -> OutputResult<()> {
        let status = observation.status_label();
        self.writer
            .write_record([observation.url.as_str(), status.as_str()])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Echoes observations as human-readable lines
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ObservationSink for ConsoleSink<W> {
    fn record(&mut self, observation: &CrawlObservation) -> OutputResult<()> {
        writeln!(
            self.out,
            "Status {} -> {}",
            observation.status_label(),
            observation.url
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Collects observations in memory
///
/// Clones share the same buffer, so a clone kept by the caller can read what
/// the writer task recorded.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    observations: Arc<Mutex<Vec<CrawlObservation>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded observations, in completion order
    pub fn observations(&self) -> Vec<CrawlObservation> {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObservationSink for MemorySink {
    fn record(&mut self, observation: &CrawlObservation) -> OutputResult<()> {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observation.clone());
        Ok(())
    }
}
