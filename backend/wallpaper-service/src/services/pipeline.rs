//! Cache-aside resolution pipeline
//!
//! Each request runs two steps: resolve the current image URL (cache hit or
//! feed fetch + selection), then resolve the image bytes for that URL (cache
//! hit or fetch + transcode). The binary key is always derived from the URL
//! resolved in step one, so the two key families can never combine into
//! inconsistent output. The cache is an optimization: every cache failure
//! degrades to a fresh fetch or a logged warning, never a failed request.

use crate::cache::{keys, CacheStore};
use crate::error::{AppError, Result};
use crate::services::feed;
use crate::services::fetcher::ImageSource;
use crate::services::transcoder::{transcode_async, Transcoder};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, warn};

/// Final payload handed to the HTTP layer
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Orchestrates feed lookup, image fetch, transcoding, and both cache tiers
#[derive(Clone)]
pub struct ResolutionPipeline {
    source: Arc<dyn ImageSource>,
    transcoder: Arc<dyn Transcoder>,
}

impl ResolutionPipeline {
    pub fn new(source: Arc<dyn ImageSource>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self { source, transcoder }
    }

    /// Resolve the current image for one request
    pub async fn resolve(&self, cache: Arc<dyn CacheStore>) -> Result<ResolvedImage> {
        let url = self.resolve_url(cache.as_ref()).await?;
        self.resolve_binary(cache, &url).await
    }

    /// Step 1: determine the URL of the current top image
    async fn resolve_url(&self, cache: &dyn CacheStore) -> Result<String> {
        match cache.get(keys::LATEST_IMAGE).await {
            Ok(Some(raw)) if !raw.is_empty() => match String::from_utf8(raw) {
                Ok(url) => {
                    info!("image url fetched from cache");
                    return Ok(url);
                }
                Err(_) => warn!("cached image url is not valid utf-8, refetching"),
            },
            Ok(_) => {}
            Err(err) => warn!("cache read failed, fetching fresh: {err}"),
        }

        info!("fetching latest image");
        let page = self.source.fetch_feed().await.map_err(AppError::FeedFetch)?;
        let url = feed::select_eligible_entry(&page)?.to_string();

        if let Err(err) = cache
            .set(keys::LATEST_IMAGE, url.as_bytes(), keys::TTL_SECONDS)
            .await
        {
            warn!("could not cache image url: {err}");
        }

        Ok(url)
    }

    /// Step 2: produce the bytes for the resolved URL
    async fn resolve_binary(&self, cache: Arc<dyn CacheStore>, url: &str) -> Result<ResolvedImage> {
        let key = keys::binary_key(url);

        match cache.get(&key).await {
            Ok(Some(bytes)) if !bytes.is_empty() => {
                info!("image data fetched from cache");
                return Ok(ResolvedImage {
                    bytes: Bytes::from(bytes),
                    content_type: self.transcoder.cached_content_type().to_string(),
                });
            }
            Ok(_) => {}
            Err(err) => warn!("cache read failed, fetching fresh: {err}"),
        }

        let fetched = self
            .source
            .fetch_binary(url)
            .await
            .map_err(AppError::ImageFetch)?;

        let image =
            transcode_async(self.transcoder.clone(), fetched.bytes, fetched.content_type).await?;

        // Populate the binary tier off the response path; a failed write is
        // logged and must never block or fail the in-flight response.
        let payload = image.bytes.clone();
        tokio::spawn(async move {
            if let Err(err) = cache.set(&key, &payload, keys::TTL_SECONDS).await {
                warn!("could not cache image data: {err}");
            }
        });

        Ok(ResolvedImage {
            bytes: image.bytes,
            content_type: image.content_type,
        })
    }
}
