//! Wallpaper Service - HTTP server bootstrap
//!
//! Wires configuration, the optional Redis cache backend, and the resolution
//! pipeline into a single-route actix-web server.

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallpaper_service::cache::CacheHandle;
use wallpaper_service::services::{
    HttpSource, ImageSource, JpegShrinker, PassThrough, ResolutionPipeline, Transcoder,
};
use wallpaper_service::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting wallpaper-service");

    let config = Config::from_env();

    // Optional cache backend. A missing or unreachable backend is a
    // supported degraded mode, not a startup failure; connections are only
    // attempted per request.
    let cache_handle = match &config.cache.redis_url {
        None => {
            tracing::warn!("REDIS_URL not set, running without a cache backend");
            CacheHandle::default()
        }
        Some(redis_url) => match CacheHandle::from_url(redis_url) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!("REDIS_URL is not valid, running without a cache: {err}");
                CacheHandle::default()
            }
        },
    };

    let source: Arc<dyn ImageSource> = Arc::new(
        HttpSource::new(config.feed.feed_url.clone(), config.feed.http_timeout_secs)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("http client: {e}")))?,
    );

    let transcoder: Arc<dyn Transcoder> = if config.image.transcode_enabled {
        Arc::new(JpegShrinker::new(
            config.image.max_dimension,
            config.image.jpeg_quality,
        ))
    } else {
        Arc::new(PassThrough)
    };

    let pipeline = ResolutionPipeline::new(source, transcoder);

    let bind_address = (config.app.host.clone(), config.app.port);
    let path = config.app.path_prefix.clone();
    tracing::info!(
        "wallpaper-service HTTP listening on {}:{} at path {}",
        bind_address.0,
        bind_address.1,
        path
    );

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &config.cors.allowed_origins {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors
            .allowed_methods(["GET", "OPTIONS"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(pipeline.clone()))
            .app_data(web::Data::new(cache_handle.clone()))
            .wrap(Logger::default())
            .wrap(cors)
            .route("/health", web::get().to(wallpaper_service::handlers::health))
            .route(
                &path,
                web::get().to(wallpaper_service::handlers::latest_image),
            )
    })
    .bind(bind_address)?
    .run()
    .await
}
