//! HTTP-level tests for the image endpoint
//!
//! Drives the real handler + pipeline through `actix_web::test` with a
//! scripted upstream standing in for the feed and image hosts.

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

use wallpaper_service::cache::CacheHandle;
use wallpaper_service::error::FetchError;
use wallpaper_service::handlers;
use wallpaper_service::services::feed::FeedPage;
use wallpaper_service::services::fetcher::{FetchedImage, ImageSource};
use wallpaper_service::services::{JpegShrinker, ResolutionPipeline, Transcoder};

/// Scripted upstream: a fixed feed page and a fixed binary response
struct ScriptedSource {
    feed_status: Option<reqwest::StatusCode>,
    feed_children: serde_json::Value,
    binary_status: Option<reqwest::StatusCode>,
    image: Vec<u8>,
}

impl ScriptedSource {
    fn serving(image: Vec<u8>) -> Self {
        Self {
            feed_status: None,
            feed_children: json!([
                { "kind": "t3", "data": { "url": "https://img/pinned.jpg" } },
                { "kind": "t3", "data": { "url_overridden_by_dest": "https://img/1.jpg" } }
            ]),
            binary_status: None,
            image,
        }
    }
}

#[async_trait]
impl ImageSource for ScriptedSource {
    async fn fetch_feed(&self) -> Result<FeedPage, FetchError> {
        if let Some(status) = self.feed_status {
            return Err(FetchError::Status(status));
        }
        let page = json!({ "data": { "after": null, "children": self.feed_children } });
        Ok(serde_json::from_value(page).expect("valid feed page"))
    }

    async fn fetch_binary(&self, _url: &str) -> Result<FetchedImage, FetchError> {
        if let Some(status) = self.binary_status {
            return Err(FetchError::Status(status));
        }
        Ok(FetchedImage {
            bytes: Bytes::from(self.image.clone()),
            content_type: Some("image/png".to_string()),
        })
    }
}

fn png_fixture() -> Vec<u8> {
    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
    let img = ImageBuffer::from_fn(320, 240, |x, y| Rgb([x as u8, y as u8, 64u8]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    buf
}

fn app_state(source: ScriptedSource) -> (web::Data<ResolutionPipeline>, web::Data<CacheHandle>) {
    let transcoder: Arc<dyn Transcoder> = Arc::new(JpegShrinker::new(1200, 70));
    let pipeline = ResolutionPipeline::new(Arc::new(source), transcoder);
    (
        web::Data::new(pipeline),
        web::Data::new(CacheHandle::default()),
    )
}

macro_rules! build_app {
    ($source:expr) => {{
        let (pipeline, cache) = app_state($source);
        test::init_service(
            App::new()
                .app_data(pipeline)
                .app_data(cache)
                .route("/", web::get().to(handlers::latest_image))
                .route("/health", web::get().to(handlers::health)),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_serves_transcoded_image_with_cache_control() {
    let app = build_app!(ScriptedSource::serving(png_fixture()));

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=600"
    );
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    let body = test::read_body(resp).await;
    assert!(image::load_from_memory(&body).is_ok());
}

#[actix_web::test]
async fn test_binary_fetch_404_maps_to_image_error() {
    let source = ScriptedSource {
        binary_status: Some(reqwest::StatusCode::NOT_FOUND),
        ..ScriptedSource::serving(Vec::new())
    };
    let app = build_app!(source);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = test::read_body(resp).await;
    assert_eq!(body, Bytes::from_static(b"Error fetching image"));
}

#[actix_web::test]
async fn test_feed_failure_maps_to_latest_image_error() {
    let source = ScriptedSource {
        feed_status: Some(reqwest::StatusCode::SERVICE_UNAVAILABLE),
        ..ScriptedSource::serving(Vec::new())
    };
    let app = build_app!(source);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = test::read_body(resp).await;
    assert_eq!(body, Bytes::from_static(b"Error fetching latest image"));
}

#[actix_web::test]
async fn test_all_gallery_feed_maps_to_latest_image_error() {
    let source = ScriptedSource {
        feed_children: json!([
            { "kind": "t3", "data": { "url": "https://img/pinned.jpg" } },
            { "kind": "t3", "data": { "url_overridden_by_dest": "https://www.reddit.com/gallery/a" } }
        ]),
        ..ScriptedSource::serving(Vec::new())
    };
    let app = build_app!(source);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = test::read_body(resp).await;
    assert_eq!(body, Bytes::from_static(b"Error fetching latest image"));
}

#[actix_web::test]
async fn test_undecodable_image_maps_to_resize_error() {
    let app = build_app!(ScriptedSource::serving(b"not an image".to_vec()));

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = test::read_body(resp).await;
    assert_eq!(body, Bytes::from_static(b"Error resizing image"));
}

#[actix_web::test]
async fn test_health_endpoint() {
    let app = build_app!(ScriptedSource::serving(png_fixture()));

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
}
