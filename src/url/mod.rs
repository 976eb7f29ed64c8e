//! URL handling module for Sumi-Skim
//!
//! This module provides URL normalization, host extraction, and the scope
//! filter that keeps a crawl on its seed's site.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::extract_domain;
pub use normalize::{normalize_url, resolve_href};
pub use scope::{ScopeFilter, ScopeMode};
