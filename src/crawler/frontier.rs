//! Deduplicating frontier
//!
//! The frontier owns the set of every URL admitted during one crawl session.
//! Admission is the single point where workers race on shared state, so the
//! check-and-insert happens under one mutex.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use url::Url;

/// A unit of crawl work: a normalized URL and its distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL to fetch
    pub url: Url,

    /// Depth from the seed (seed is 0)
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Session-scoped visited set gated by depth
#[derive(Debug)]
pub struct Frontier {
    max_depth: u32,
    visited: Mutex<HashSet<String>>,
}

impl Frontier {
    /// Creates an empty frontier admitting depths `0..=max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            visited: Mutex::new(HashSet::new()),
        }
    }

    /// Attempts to admit `url` at `depth`
    ///
    /// Returns `true` exactly once per distinct URL string, and never for a
    /// depth beyond the configured maximum. Rejected-by-depth URLs are not
    /// recorded, so the same URL may still be admitted later at a shallower
    /// depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_skim::crawler::Frontier;
    /// use url::Url;
    ///
    /// let frontier = Frontier::new(1);
    /// let url = Url::parse("https://example.com/a").unwrap();
    ///
    /// assert!(frontier.try_admit(&url, 1));
    /// assert!(!frontier.try_admit(&url, 1));
    /// assert!(!frontier.try_admit(&Url::parse("https://example.com/b").unwrap(), 2));
    /// ```
    pub fn try_admit(&self, url: &Url, depth: u32) -> bool {
        if depth > self.max_depth {
            return false;
        }

        // A poisoned set is still a valid set: inserts are atomic.
        let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
        visited.insert(url.as_str().to_owned())
    }

    /// Returns true if `url` has been admitted
    pub fn contains(&self, url: &Url) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url.as_str())
    }

    /// Number of URLs admitted so far
    pub fn len(&self) -> usize {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_admits_once() {
        let frontier = Frontier::new(2);
        let a = url("http://example.com/a");

        assert!(frontier.try_admit(&a, 0));
        assert!(!frontier.try_admit(&a, 0));
        assert!(!frontier.try_admit(&a, 1));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_depth_gate() {
        let frontier = Frontier::new(1);

        assert!(frontier.try_admit(&url("http://example.com/"), 0));
        assert!(frontier.try_admit(&url("http://example.com/a"), 1));
        assert!(!frontier.try_admit(&url("http://example.com/b"), 2));
        assert!(!frontier.contains(&url("http://example.com/b")));
    }

    #[test]
    fn test_depth_rejection_does_not_mark_visited() {
        let frontier = Frontier::new(1);
        let b = url("http://example.com/b");

        assert!(!frontier.try_admit(&b, 5));
        assert!(frontier.try_admit(&b, 1));
    }

    #[test]
    fn test_zero_depth_admits_only_seed_level() {
        let frontier = Frontier::new(0);
        assert!(frontier.try_admit(&url("http://example.com/"), 0));
        assert!(!frontier.try_admit(&url("http://example.com/a"), 1));
    }

    #[test]
    fn test_byte_equal_strings_only() {
        let frontier = Frontier::new(3);
        assert!(frontier.try_admit(&url("http://example.com/a"), 1));
        assert!(frontier.try_admit(&url("http://example.com/a/"), 1));
        assert!(frontier.try_admit(&url("https://example.com/a"), 1));
        assert_eq!(frontier.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_admission_single_winner() {
        let frontier = Arc::new(Frontier::new(3));
        let target = url("http://example.com/contested");

        let mut handles = Vec::new();
        for _ in 0..64 {
            let frontier = Arc::clone(&frontier);
            let target = target.clone();
            handles.push(tokio::spawn(async move { frontier.try_admit(&target, 1) }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(frontier.len(), 1);
    }
}
