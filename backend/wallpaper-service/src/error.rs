//! Error types for wallpaper-service
//!
//! Leaf enums cover the individual stages (fetching, selecting, transcoding,
//! caching); `AppError` carries the stage attribution the HTTP layer needs to
//! produce the endpoint's fixed plain-text error bodies.

use actix_web::{http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for wallpaper-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors from a single upstream HTTP round-trip.
///
/// `Transport` means the host could not be reached (or the body could not be
/// read/decoded); `Status` means the host answered with a non-2xx status.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not reach upstream: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream responded with status {0}")]
    Status(reqwest::StatusCode),
}

/// Errors from the image transcoding stage.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Errors from feed-entry selection.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("no eligible entry in feed page")]
    NoEligibleEntry,
}

/// Cache-layer errors. These signal degraded mode and are always recovered
/// locally; they are intentionally not convertible into `AppError` so they
/// can never leak into an HTTP response.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache operation timed out")]
    Timeout,
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Top-level application error, attributed to the pipeline stage it occurred
/// in so the handler can emit the matching response body.
#[derive(Debug, Error)]
pub enum AppError {
    /// Feed fetch or decode failed while resolving the image URL
    #[error("error fetching latest image: {0}")]
    FeedFetch(#[source] FetchError),

    /// Feed page contained no eligible entry
    #[error("error fetching latest image: {0}")]
    NoEligibleEntry(#[from] SelectError),

    /// Image binary fetch failed
    #[error("error fetching image: {0}")]
    ImageFetch(#[source] FetchError),

    /// Transcoding the fetched image failed
    #[error("error resizing image: {0}")]
    Transcode(#[from] TranscodeError),
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::FeedFetch(_) | AppError::NoEligibleEntry(_) => "Error fetching latest image",
            AppError::ImageFetch(_) => "Error fetching image",
            AppError::Transcode(_) => "Error resizing image",
        };

        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}
