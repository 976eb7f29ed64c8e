//! Output sink traits and observation types
//!
//! This module defines the record produced for every fetch attempt and the
//! trait interface implemented by observation sinks.

use crate::crawler::FetchError;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink writer stopped: {0}")]
    WriterStopped(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Outcome of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server answered with this HTTP status
    Response { status: u16 },

    /// No response was received
    Failed(FetchError),
}

impl FetchOutcome {
    /// HTTP status code, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response { status } => Some(*status),
            Self::Failed(_) => None,
        }
    }

    /// True for 2xx responses
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Response { status } if (200..300).contains(status))
    }

    /// True when no response was received
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Value written in the `Status` column: the status code or an error marker
    pub fn status_label(&self) -> String {
        match self {
            Self::Response { status } => status.to_string(),
            Self::Failed(error) => error.marker().to_string(),
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response { status } => write!(f, "{}", status),
            Self::Failed(error) => write!(f, "{} ({})", error.marker(), error),
        }
    }
}

/// One record per fetch attempt
#[derive(Debug, Clone)]
pub struct CrawlObservation {
    /// Normalized URL that was fetched
    pub url: String,

    /// Depth of the URL from the seed
    pub depth: u32,

    /// Status code or transport failure
    pub outcome: FetchOutcome,

    /// When the fetch started (after pacing, with a governor permit held)
    pub started_at: DateTime<Utc>,

    /// When the response or failure was observed
    pub finished_at: DateTime<Utc>,
}

impl CrawlObservation {
    pub fn status_label(&self) -> String {
        self.outcome.status_label()
    }
}

/// Trait for observation sinks
///
/// A sink is owned by a single writer task, so implementations need not
/// synchronize internally.
pub trait ObservationSink: Send {
    /// Records one observation
    fn record(&mut self, observation: &CrawlObservation) -> OutputResult<()>;

    /// Flushes buffered output once the crawl is complete
    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
