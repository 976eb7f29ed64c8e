//! Configuration module for Sumi-Skim
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Command-line flags are layered on top by the binary before
//! [`validate`] runs.
//!
//! # Example
//!
//! ```no_run
//! use sumi_skim::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("skim.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawl.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CrawlConfig, CrawlSettings, HeadlessConfig, OutputConfig, RequestConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
