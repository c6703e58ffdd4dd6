use super::*;
use crate::config::RetryConfig;
use crate::types::{AppRecord, Store};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;


const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Engine wired to a mock upstream, plus its config, for router construction
fn create_test_hunter(server: &MockServer) -> (Arc<IconHunter>, Arc<Config>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().expect("tempdir");

    let mut config = Config::default();
    config.stores.appstore.base_url = server.uri();
    config.stores.googleplay.base_url = server.uri();
    config.download.output_dir = temp_dir.path().to_path_buf();
    config.retry = RetryConfig {
        max_attempts: 1,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 2.0,
        jitter: false,
    };

    let hunter = Arc::new(IconHunter::new(config.clone()).expect("engine must build"));
    (hunter, Arc::new(config), temp_dir)
}

fn test_app(name: &str, icon_url: &str) -> AppRecord {
    AppRecord {
        name: name.to_string(),
        store: Store::Appstore,
        price: "Free".to_string(),
        rating: None,
        icon_url: icon_url.to_string(),
        developer: None,
        bundle_id: None,
    }
}

fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("build request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test]
async fn health_endpoint_reports_ok_and_version() {
    let server = MockServer::start().await;
    let (hunter, config, _temp_dir) = create_test_hunter(&server);
    let app = create_router(hunter, config);

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn cors_headers_are_present_when_enabled() {
    let server = MockServer::start().await;
    let (hunter, config, _temp_dir) = create_test_hunter(&server);
    let app = create_router(hunter, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn router_builds_with_swagger_disabled() {
    let server = MockServer::start().await;
    let (hunter, config, _temp_dir) = create_test_hunter(&server);

    let mut config = (*config).clone();
    config.server.api.swagger_ui = false;
    config.server.api.cors_enabled = false;
    let app = create_router(hunter, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn openapi_endpoint_serves_the_spec() {
    let server = MockServer::start().await;
    let (hunter, config, _temp_dir) = create_test_hunter(&server);
    let app = create_router(hunter, config);

    let request = Request::builder()
        .uri("/openapi.json")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    assert!(body["paths"].get("/download").is_some());
}

#[tokio::test]
async fn api_server_binds_and_serves() {
    let server = MockServer::start().await;
    let (hunter, config, _temp_dir) = create_test_hunter(&server);

    // Port 0 = OS assigns a free port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(serve(listener, hunter, config));

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    handle.abort();
}
