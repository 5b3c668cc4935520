#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgba, RgbaImage};
use sigcraft_core::signature::SocialPlatform;
use sigcraft_pipeline::assets::{MemoryAssets, MemoryRasterStore};
use sigcraft_pipeline::raster::SurfacePool;
use sigcraft_pipeline::templates::icon_url;
use sigcraft_pipeline::Exporter;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use sigcraft_api::config::ServerConfig;
use sigcraft_api::routes;
use sigcraft_api::state::AppState;
use sigcraft_api::store::{MemorySignatureStore, SignatureStore};

pub const HEADSHOT_URL: &str = "https://cdn.test/headshot.png";
pub const LOGO_URL: &str = "https://cdn.test/logo.png";

/// Build a test `ServerConfig` with safe defaults and a short frame loop.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "https://sig.test".to_string(),
        icon_base_url: "https://icons.test".to_string(),
        frame_count: 4,
        frame_delay_ms: 100,
        export_timeout_secs: 10,
        render_surfaces: 1,
        surface_acquire_timeout_ms: 1_000,
        ..ServerConfig::default()
    }
}

fn png(color: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(32, 32, Rgba(color))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Headshot, logo and every icon variant the layouts reference.
pub fn fixture_assets(config: &ServerConfig) -> MemoryAssets {
    let mut assets = MemoryAssets::new()
        .with(HEADSHOT_URL, png([200, 40, 40, 255]))
        .with(LOGO_URL, png([40, 40, 200, 255]));
    for variant in ["color", "light"] {
        for platform in SocialPlatform::ALL {
            assets.insert(icon_url(&config.icon_base_url, variant, platform), png([20, 20, 20, 255]));
        }
    }
    assets
}

/// A running test application and the raster store behind it.
pub struct TestApp {
    pub router: Router,
    pub rasters: Arc<MemoryRasterStore>,
}

/// Build the full application router with all middleware layers over the
/// given signature store.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app_with(store: Arc<dyn SignatureStore>) -> TestApp {
    let config = test_config();
    let rasters = Arc::new(MemoryRasterStore::new(config.generated_base_url()));
    let exporter = Exporter::new(
        config.export_config(),
        Arc::new(SurfacePool::new(
            config.render_surfaces,
            Duration::from_millis(config.surface_acquire_timeout_ms),
        )),
        Arc::new(fixture_assets(&config)),
        rasters.clone(),
    );

    let state = AppState {
        store,
        exporter: Arc::new(exporter),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestApp { router, rasters }
}

/// Test application over a fresh in-memory store.
pub fn build_test_app() -> TestApp {
    build_test_app_with(Arc::new(MemorySignatureStore::new()))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn with_json(app: &Router, method: Method, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    with_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    with_json(app, Method::PUT, uri, body).await
}

pub async fn delete(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// A complete signature payload for the given template.
pub fn signature_payload(template: &str) -> serde_json::Value {
    serde_json::json!({
        "templateId": template,
        "personalInfo": {
            "name": "Jordan Smith",
            "title": "Account Executive",
            "company": "Apex Solutions",
            "email": "jordan@apex.test",
            "phone": "+1 555 0100",
            "website": "apex.test"
        },
        "images": {
            "headshot": HEADSHOT_URL,
            "logo": { "url": LOGO_URL },
            "headshotSize": 100,
            "logoSize": 100
        },
        "socialMedia": {
            "linkedin": "https://linkedin.com/in/jordan",
            "twitter": "https://twitter.com/jordan"
        }
    })
}

/// Create a signature and return its id.
pub async fn create_signature(app: &Router, body: serde_json::Value) -> String {
    let response = post_json(app, "/api/v1/signatures", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}
