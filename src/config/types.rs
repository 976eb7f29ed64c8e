use crate::url::ScopeMode;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sumi-Skim
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below. The configuration is immutable once a crawl starts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlConfig {
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub headless: HeadlessConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl CrawlConfig {
    /// Creates a default configuration rooted at `seed_url`
    pub fn for_seed(seed_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.crawl.seed_url = seed_url.into();
        config
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlSettings {
    /// URL the crawl starts from; its host defines the scope
    pub seed_url: String,

    /// Maximum depth to crawl from the seed (seed is depth 0)
    pub max_depth: u32,

    /// Maximum number of concurrent fetches
    pub concurrency: u32,

    /// Host predicate applied to discovered links
    pub scope: ScopeMode,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            seed_url: String::new(),
            max_depth: 2,
            concurrency: 5,
            scope: ScopeMode::Substring,
        }
    }
}

/// Per-request configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RequestConfig {
    /// User-Agent values, rotated round-robin across requests
    pub user_agents: Vec<String>,

    /// Optional upstream proxy for every fetch
    pub proxy: Option<String>,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Lower bound of the randomized pre-fetch delay (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the randomized pre-fetch delay (milliseconds)
    pub max_delay_ms: u64,
}

impl RequestConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            user_agents: vec!["Mozilla/5.0".to_string()],
            proxy: None,
            timeout_secs: 30,
            min_delay_ms: 0,
            max_delay_ms: 1000,
        }
    }
}

/// Headless browser fallback configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HeadlessConfig {
    /// Whether pages without static links may be rendered in Chromium
    pub enabled: bool,

    /// Time to let scripts run after navigation (milliseconds)
    pub settle_ms: u64,

    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,

    /// Explicit Chromium binary; autodetected when unset
    pub chrome_path: Option<PathBuf>,
}

impl HeadlessConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            settle_ms: 3000,
            navigation_timeout_secs: 30,
            chrome_path: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// CSV file receiving one row per observation; stdout echo when unset
    pub csv_path: Option<PathBuf>,
}
