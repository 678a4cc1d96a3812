use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;

/// Retrieves the raw markup behind a URL.
///
/// An `Err` means the page is unusable: transport failure, timeout or a
/// non-2xx status. Callers parse the body with [`crate::dom::Document::parse`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// `headers` are sent with every request (the `User-Agent` among them).
    pub fn new(headers: &[(String, String)], timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name '{}'", name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header '{}'", name.as_str()))?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = res.status();
        if !status.is_success() {
            return Err(anyhow!("{} -> HTTP {}", url, status));
        }
        res.text().await.context("reading body failed")
    }
}
