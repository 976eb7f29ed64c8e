use crate::UrlError;
use url::Url;

/// Normalizes an absolute URL according to Sumi-Skim's normalization rules
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http and https
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after #)
/// 5. Remove the query string
///
/// Host lowercasing, default port elision and dot-segment removal are left to
/// the URL parser. Applying this function to its own output returns the same
/// string.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use sumi_skim::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.COM/page?id=3#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    strip(url)
}

/// Resolves an href found on `page` and normalizes the result
///
/// Relative references are resolved against the page URL before the same
/// rules as [`normalize_url`] are applied.
///
/// # Examples
///
/// ```
/// use sumi_skim::url::resolve_href;
/// use url::Url;
///
/// let page = Url::parse("http://example.com/docs/index.html").unwrap();
/// let url = resolve_href("../about#team", &page).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/about");
///
/// assert!(resolve_href("javascript:void(0)", &page).is_err());
/// ```
pub fn resolve_href(href: &str, page: &Url) -> Result<Url, UrlError> {
    let url = page
        .join(href.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    strip(url)
}

fn strip(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    url.set_query(None);

    Ok(url)
}
