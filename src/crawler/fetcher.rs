//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client (timeouts, proxy, compression)
//! - GET requests with a per-request user agent
//! - Classifying responses and transport failures

use crate::config::RequestConfig;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Transport-level failure for an admitted URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("fetch aborted: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Short marker written in place of a status code
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Timeout => "error:timeout",
            Self::Connect(_) => "error:connect",
            Self::Body(_) => "error:body",
            Self::Transport(_) => "error:transport",
            Self::Aborted(_) => "error:aborted",
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successful HTML response
    Page {
        /// HTTP status code
        status_code: u16,
        /// Final URL after redirects
        final_url: Url,
        /// Page body content
        body: String,
    },

    /// Successful response that is not HTML
    ContentMismatch {
        /// HTTP status code
        status_code: u16,
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError(FetchError),
}

impl FetchResult {
    /// HTTP status code, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Page { status_code, .. }
            | Self::ContentMismatch { status_code, .. }
            | Self::HttpError { status_code } => Some(*status_code),
            Self::NetworkError(_) => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed with reqwest's default policy (up to 10 hops).
/// When a proxy is configured every request goes through it.
///
/// # Example
///
/// ```no_run
/// use sumi_skim::config::RequestConfig;
/// use sumi_skim::crawler::build_http_client;
///
/// let client = build_http_client(&RequestConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RequestConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10).min(config.timeout()))
        .gzip(true)
        .brotli(true);

    if let Some(user_agent) = config.user_agents.first() {
        builder = builder.user_agent(user_agent.clone());
    }

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Fetches a URL and classifies the outcome
///
/// # Response Handling
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx, HTML or no Content-Type | Page |
/// | 2xx, other Content-Type | ContentMismatch |
/// | non-2xx | HttpError |
/// | Timeout | NetworkError(Timeout) |
/// | Connection refused / DNS / TLS | NetworkError(Connect) |
/// | Body read failure | NetworkError(Body) |
///
/// No retries are attempted.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
/// * `user_agent` - Overrides the client's default User-Agent when set
pub async fn fetch_url(client: &Client, url: &Url, user_agent: Option<&str>) -> FetchResult {
    let mut request = client.get(url.clone());
    if let Some(user_agent) = user_agent {
        request = request.header(USER_AGENT, user_agent);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return FetchResult::NetworkError(classify_error(&e)),
    };

    let status = response.status();
    let status_code = status.as_u16();

    if !status.is_success() {
        return FetchResult::HttpError { status_code };
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    if let Some(content_type) = content_type.filter(|ct| !ct.contains("html")) {
        return FetchResult::ContentMismatch {
            status_code,
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Page {
            status_code,
            final_url,
            body,
        },
        Err(e) => FetchResult::NetworkError(FetchError::Body(e.to_string())),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Connect(e.to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_http_client(&RequestConfig::default()).unwrap()
    }

    fn url(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&RequestConfig::default()).is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let config = RequestConfig {
            proxy: Some("http://127.0.0.1:3128".to_string()),
            ..RequestConfig::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_markers() {
        assert_eq!(FetchError::Timeout.marker(), "error:timeout");
        assert_eq!(FetchError::Connect("x".into()).marker(), "error:connect");
        assert_eq!(FetchError::Transport("x".into()).marker(), "error:transport");
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<a href=\"/a\">A</a>", "text/html"),
            )
            .mount(&server)
            .await;

        match fetch_url(&client(), &url(&server, "/"), None).await {
            FetchResult::Page {
                status_code, body, ..
            } => {
                assert_eq!(status_code, 200);
                assert!(body.contains("/a"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ua"))
            .and(header("user-agent", "SkimBot/2.0"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("ok", "text/html"))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch_url(&client(), &url(&server, "/ua"), Some("SkimBot/2.0")).await;
        assert_eq!(result.status_code(), Some(200));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetch_url(&client(), &url(&server, "/missing"), None).await;
        assert!(matches!(result, FetchResult::HttpError { status_code: 404 }));
    }

    #[tokio::test]
    async fn test_fetch_non_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x25, 0x50], "application/pdf"))
            .mount(&server)
            .await;

        match fetch_url(&client(), &url(&server, "/doc.pdf"), None).await {
            FetchResult::ContentMismatch {
                status_code,
                content_type,
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(content_type, "application/pdf");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let target = Url::parse("http://127.0.0.1:1/").unwrap();
        let result = fetch_url(&client(), &target, None).await;
        assert!(matches!(
            result,
            FetchResult::NetworkError(FetchError::Connect(_))
        ));
        assert_eq!(result.status_code(), None);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = RequestConfig {
            timeout_secs: 1,
            ..RequestConfig::default()
        };
        let client = build_http_client(&config).unwrap();

        let result = fetch_url(&client, &url(&server, "/slow"), None).await;
        assert!(matches!(result, FetchResult::NetworkError(FetchError::Timeout)));
    }
}
