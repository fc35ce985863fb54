//! HTTP handlers
use actix_web::http::header;
use actix_web::{web, HttpResponse};

use crate::cache::CacheHandle;
use crate::error::Result;
use crate::services::ResolutionPipeline;

/// Browser/CDN caching window, matching the cache TTL
const CACHE_CONTROL: &str = "public, max-age=600";

/// Serve the current top wallpaper image
pub async fn latest_image(
    pipeline: web::Data<ResolutionPipeline>,
    cache: web::Data<CacheHandle>,
) -> Result<HttpResponse> {
    let store = cache.session().await;
    let image = pipeline.resolve(store).await?;

    Ok(HttpResponse::Ok()
        .content_type(image.content_type)
        .insert_header((header::CACHE_CONTROL, CACHE_CONTROL))
        .body(image.bytes))
}

/// Liveness endpoint
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
