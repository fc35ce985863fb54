//! Upstream HTTP access
//!
//! One GET per call, no retry. Transport failures and non-2xx statuses are
//! surfaced as distinct error variants so callers can tell "could not reach
//! the source" apart from "the source rejected us".

use crate::error::FetchError;
use crate::services::feed::FeedPage;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Image binary plus the content type the upstream reported
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Source of feed pages and image binaries
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_feed(&self) -> Result<FeedPage, FetchError>;
    async fn fetch_binary(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// HTTP-backed image source
pub struct HttpSource {
    client: Client,
    feed_url: String,
}

impl HttpSource {
    pub fn new(feed_url: String, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("wallpaper-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, feed_url })
    }
}

#[async_trait]
impl ImageSource for HttpSource {
    async fn fetch_feed(&self) -> Result<FeedPage, FetchError> {
        let response = self.client.get(&self.feed_url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let page = response.json::<FeedPage>().await?;
        debug!(entries = page.data.children.len(), "feed page fetched");
        Ok(page)
    }

    async fn fetch_binary(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let bytes = response.bytes().await?;
        debug!(url, size = bytes.len(), "image binary fetched");

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}
