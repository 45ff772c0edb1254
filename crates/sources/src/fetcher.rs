//! Fetching pages from the review sites.
//!
//! Sources depend on the `PageFetcher` trait rather than on an HTTP client,
//! so tests can serve canned pages.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;

/// Desktop browser identity; the sites serve reduced pages (or refuse) without one.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:103.0) Gecko/20100101 Firefox/103.0";

/// Anything that can turn a URL into page text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `PageFetcher` backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!("GET {} returned {} bytes", url, body.len());
        Ok(body)
    }
}
