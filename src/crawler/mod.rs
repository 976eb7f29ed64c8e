//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The deduplicating, depth-gated frontier
//! - The governor bounding and pacing concurrent fetches
//! - HTTP fetching and outcome classification
//! - HTML parsing and the headless render fallback
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod governor;
mod parser;
mod render;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchResult};
pub use frontier::{Frontier, FrontierEntry};
pub use governor::{FetchPermit, Governor};
pub use parser::{parse_html, ParsedPage};
pub use render::{ChromiumRenderer, LinkRenderer, RenderError, LINK_SCRIPT};
