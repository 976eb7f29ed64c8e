use super::extract_domain;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Predicate used to decide whether a host belongs to the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    /// Candidate host contains the scope host anywhere.
    ///
    /// This is the legacy behaviour and it is permissive: scope `example.com`
    /// also accepts `example.com.attacker.net` and `myexample.com`.
    #[default]
    Substring,
    /// Candidate host equals the scope host
    Exact,
    /// Candidate host equals the scope host or is one of its subdomains
    Suffix,
}

impl ScopeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::Exact => "exact",
            Self::Suffix => "suffix",
        }
    }
}

impl fmt::Display for ScopeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substring" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            "suffix" => Ok(Self::Suffix),
            other => Err(format!(
                "unknown scope mode '{}' (expected substring, exact or suffix)",
                other
            )),
        }
    }
}

/// Decides whether a normalized URL belongs to the crawl's target site
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    host: String,
    mode: ScopeMode,
}

impl ScopeFilter {
    /// Creates a filter for `host` (lowercased) using `mode`
    pub fn new(host: &str, mode: ScopeMode) -> Self {
        Self {
            host: host.to_lowercase(),
            mode,
        }
    }

    /// Creates a filter scoped to the host of `seed`
    ///
    /// Returns `None` if the seed has no host.
    pub fn for_seed(seed: &Url, mode: ScopeMode) -> Option<Self> {
        extract_domain(seed).map(|host| Self { host, mode })
    }

    /// The scope host
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn mode(&self) -> ScopeMode {
        self.mode
    }

    /// Returns true if the URL's host satisfies the scope predicate
    pub fn allows(&self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(candidate) => self.allows_host(&candidate),
            None => false,
        }
    }

    /// Returns true if a lowercase host satisfies the scope predicate
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_skim::url::{ScopeFilter, ScopeMode};
    ///
    /// let exact = ScopeFilter::new("example.com", ScopeMode::Exact);
    /// assert!(exact.allows_host("example.com"));
    /// assert!(!exact.allows_host("blog.example.com"));
    ///
    /// let suffix = ScopeFilter::new("example.com", ScopeMode::Suffix);
    /// assert!(suffix.allows_host("blog.example.com"));
    /// assert!(!suffix.allows_host("notexample.com"));
    /// ```
    pub fn allows_host(&self, candidate: &str) -> bool {
        if self.host.is_empty() || candidate.is_empty() {
            return false;
        }

        match self.mode {
            ScopeMode::Substring => candidate.contains(&self.host),
            ScopeMode::Exact => candidate == self.host,
            ScopeMode::Suffix => {
                candidate == self.host
                    || candidate
                        .strip_suffix(self.host.as_str())
                        .map_or(false, |prefix| prefix.ends_with('.'))
            }
        }
    }
}
