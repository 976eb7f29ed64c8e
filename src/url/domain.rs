use url::Url;

/// Extracts the host from a URL
///
/// The host is converted to lowercase. Ports are not part of the result.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_skim::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
