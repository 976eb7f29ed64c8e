//! Headless rendering fallback for script-built pages
//!
//! Some pages only produce their anchors after JavaScript runs. The
//! [`LinkRenderer`] trait abstracts a browser that can load such a page and
//! report the `href` of every anchor in the rendered DOM. The Chromium
//! implementation drives a headless browser through chromiumoxide.
//!
//! The coordinator decides when to render; this module shares no state with
//! the static HTML path.

use crate::config::HeadlessConfig;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

/// Script evaluated in the rendered page to collect anchor targets
pub const LINK_SCRIPT: &str = r#"Array.from(document.querySelectorAll("a")).map(a => a.href)"#;

/// Errors raised by the rendering fallback
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("browser unavailable: {0}")]
    Unavailable(String),

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("link script failed on {url}: {message}")]
    Evaluation { url: String, message: String },
}

/// A browser able to render a page and list its anchor hrefs
#[async_trait]
pub trait LinkRenderer: Send + Sync {
    /// Loads `url`, lets scripts settle, and returns every anchor's `href`
    async fn render_links(&self, url: &Url) -> Result<Vec<String>, RenderError>;
}

/// Chromium-backed renderer
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    settle: Duration,
    navigation_timeout: Duration,
}

impl ChromiumRenderer {
    /// Launches a headless Chromium instance
    ///
    /// # Arguments
    ///
    /// * `config` - Headless settings (binary path, settle interval, timeout)
    /// * `user_agent` - User-Agent the browser presents, if any
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Unavailable`] if no Chromium binary can be found
    /// or the process fails to start.
    pub async fn launch(
        config: &HeadlessConfig,
        user_agent: Option<&str>,
    ) -> Result<Self, RenderError> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if let Some(path) = &config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(user_agent) = user_agent {
            builder = builder.arg(format!("--user-agent={}", user_agent));
        }

        let browser_config = builder
            .build()
            .map_err(|e| RenderError::Unavailable(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Unavailable(format!("failed to launch Chromium: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::trace!("Chromium handler event error");
                }
            }
        });

        tracing::info!("Headless Chromium launched for JS fallback");

        Ok(Self {
            browser,
            handler,
            settle: config.settle(),
            navigation_timeout: config.navigation_timeout(),
        })
    }

    async fn collect_links(&self, page: &Page, url: &Url) -> Result<Vec<String>, RenderError> {
        let navigation = tokio::time::timeout(self.navigation_timeout, page.goto(url.as_str())).await;

        match navigation {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    timeout: self.navigation_timeout,
                })
            }
        }

        tokio::time::sleep(self.settle).await;

        let result = page
            .evaluate(LINK_SCRIPT)
            .await
            .map_err(|e| RenderError::Evaluation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        result
            .into_value::<Vec<String>>()
            .map_err(|e| RenderError::Evaluation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl LinkRenderer for ChromiumRenderer {
    async fn render_links(&self, url: &Url) -> Result<Vec<String>, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Unavailable(format!("failed to open page: {}", e)))?;

        let result = self.collect_links(&page, url).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close rendered page for {}: {}", url, e);
        }

        result
    }
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_script_reads_anchor_hrefs() {
        assert!(LINK_SCRIPT.contains("querySelectorAll(\"a\")"));
        assert!(LINK_SCRIPT.contains("a.href"));
    }

    #[test]
    fn test_render_error_messages() {
        let err = RenderError::Timeout {
            url: "http://example.com/".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(err.to_string().contains("timed out"));

        let err = RenderError::Unavailable("no chromium".to_string());
        assert_eq!(err.to_string(), "browser unavailable: no chromium");
    }

    #[tokio::test]
    async fn test_launch_with_missing_binary_fails() {
        let config = HeadlessConfig {
            enabled: true,
            chrome_path: Some("/nonexistent/chromium-binary".into()),
            ..HeadlessConfig::default()
        };

        let result = ChromiumRenderer::launch(&config, None).await;
        assert!(matches!(result, Err(RenderError::Unavailable(_))));
    }
}
