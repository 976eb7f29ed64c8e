//! HTML parser for extracting links
//!
//! This module parses fetched HTML and returns the raw `href` values of its
//! anchors. Resolution and filtering are left to the URL normalizer so that
//! statically and dynamically extracted links go through the same rules.

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The `<base href>` value, if the document declares one
    pub base_href: Option<String>,

    /// Raw `href` values of every `<a href>` element, in document order
    pub hrefs: Vec<String>,
}

impl ParsedPage {
    /// URL that relative hrefs on this page resolve against
    ///
    /// A document `<base href>` takes precedence over the page URL; an
    /// unusable base falls back to the page URL.
    pub fn base_url(&self, page_url: &Url) -> Url {
        self.base_href
            .as_deref()
            .and_then(|href| page_url.join(href).ok())
            .unwrap_or_else(|| page_url.clone())
    }
}

/// Parses HTML content and extracts anchor hrefs
///
/// Empty and whitespace-only hrefs are dropped; everything else, including
/// `javascript:` and `mailto:` links, is returned as written.
///
/// # Example
///
/// ```
/// use sumi_skim::crawler::parse_html;
///
/// let html = r#"<html><body><a href="/page">Link</a><a href="">Empty</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.hrefs, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        base_href: extract_base(&document),
        hrefs: extract_hrefs(&document),
    }
}

fn extract_base(document: &Html) -> Option<String> {
    let selector = Selector::parse("base[href]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}
