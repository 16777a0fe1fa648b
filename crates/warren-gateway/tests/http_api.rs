use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use warren_core::error::Result as StorageResult;
use warren_core::{CompositeKey, KeyValueStore, StorageError};
use warren_gateway::{App, AppState, RouterOptions};
use warren_slugs::{HashidsSlugifier, SlugRegistry, Slugifier, SlugsSettings};
use warren_storage::InMemoryStore;

const SALT: &str = "gateway tests";
const MIN_LENGTH: usize = 30;

fn slugifier() -> HashidsSlugifier {
    let settings = SlugsSettings::builder().salt(SALT).min_length(MIN_LENGTH).build();
    HashidsSlugifier::new(&settings).unwrap()
}

fn state_with_store<K: KeyValueStore>(store: K, public_base_url: Option<&str>) -> AppState {
    let registry = Arc::new(SlugRegistry::new(slugifier(), store, 5));
    let state = AppState::new(registry, MIN_LENGTH);
    match public_base_url {
        Some(base) => state.with_public_base_url(base),
        None => state,
    }
}

fn app_with_store<K: KeyValueStore>(store: K, public_base_url: Option<&str>) -> Router {
    App::router(state_with_store(store, public_base_url))
}

fn app() -> Router {
    app_with_store(InMemoryStore::new(), Some("https://warren.link/"))
}

fn create_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_error(body: &Value, code: u16) {
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], code);
    assert!(errors[0]["description"].is_string());
}

struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn save(&self, _key: &CompositeKey, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn load(&self, _key: &CompositeKey) -> StorageResult<String> {
        Err(StorageError::Timeout("read timed out".to_string()))
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let response = app().oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn create_then_redirect() {
    let app = app();

    let response = app
        .clone()
        .oneshot(create_request(r#"{"url": "http://en.wikipedia.com"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let slug = body["data"]["slug"].as_str().unwrap().to_owned();
    assert!(slug.len() >= MIN_LENGTH);
    assert_eq!(slugifier().decode(&slug).unwrap(), (5, 0));
    assert_eq!(
        body["data"]["short_url"],
        json!(format!("https://warren.link/{slug}"))
    );

    let response = app.oneshot(get_request(&format!("/{slug}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://en.wikipedia.com"
    );
}

#[tokio::test]
async fn repeated_urls_get_distinct_slugs() {
    let app = app();
    let mut slugs = Vec::new();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(create_request(r#"{"url": "http://en.wikipedia.com"}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        slugs.push(body["data"]["slug"].as_str().unwrap().to_owned());
    }

    assert_ne!(slugs[0], slugs[1]);
}

#[tokio::test]
async fn short_url_is_omitted_without_public_base_url() {
    let app = app_with_store(InMemoryStore::new(), None);

    let response = app
        .oneshot(create_request(r#"{"url": "https://example.com"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["data"]["slug"].is_string());
    assert!(body["data"].get("short_url").is_none());
}

#[tokio::test]
async fn invalid_urls_are_rejected() {
    for url in ["", "not a url", "ftp://example.com/file", "http://"] {
        let body = json!({ "url": url }).to_string();
        let response = app().oneshot(create_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "url {url:?}");
        assert_error(&json_body(response).await, 400);
    }
}

#[tokio::test]
async fn urls_unfit_for_a_location_header_are_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let app = app_with_store(Arc::clone(&store), None);

    for url in [
        "http://en.wikipedia.com\n",
        "http://en.wiki\npedia.com",
        "http://en.wikipedia.com/\r\nSet-Cookie: a=b",
        "http://en.wikipedia.com/a\tb",
        " http://en.wikipedia.com",
    ] {
        let body = json!({ "url": url }).to_string();
        let response = app.clone().oneshot(create_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "url {url:?}");
        assert_error(&json_body(response).await, 400);
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    for body in ["{", r#"{"link": "https://example.com"}"#, r#"{"url": 42}"#] {
        let response = app().oneshot(create_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        assert_error(&json_body(response).await, 400);
    }
}

#[tokio::test]
async fn storage_failure_on_create_is_internal_error() {
    let app = app_with_store(FailingStore, None);

    let response = app
        .oneshot(create_request(r#"{"url": "https://example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_error(&body, 500);
    assert_eq!(body["errors"][0]["description"], "internal server error");
}

#[tokio::test]
async fn storage_failure_on_lookup_is_internal_error() {
    let app = app_with_store(FailingStore, None);
    let slug = slugifier().encode(5, 0).unwrap();

    let response = app.oneshot(get_request(&format!("/{slug}"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&json_body(response).await, 500);
}

#[tokio::test]
async fn short_slugs_are_rejected_without_lookup() {
    // A lookup would fail with 500 here, so a 400 proves the registry was skipped.
    let app = app_with_store(FailingStore, None);

    let response = app.oneshot(get_request("/abc")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error(&json_body(response).await, 400);
}

#[tokio::test]
async fn undecodable_slug_is_bad_request() {
    let slug = "a".repeat(MIN_LENGTH);

    let response = app().oneshot(get_request(&format!("/{slug}"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error(&json_body(response).await, 400);
}

#[tokio::test]
async fn unknown_slug_is_not_found() {
    let slug = slugifier().encode(5, 1000).unwrap();

    let response = app().oneshot(get_request(&format!("/{slug}"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_error(&json_body(response).await, 404);
}

#[tokio::test]
async fn request_id_is_generated() {
    let response = app().oneshot(get_request("/health")).await.unwrap();

    let request_id = response.headers().get("x-request-id").unwrap();
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn request_id_is_propagated() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-1234")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-1234");
}

#[tokio::test]
async fn request_logging_passes_the_body_through() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let options = RouterOptions {
        log_requests: true,
        log_elapsed_time: true,
    };
    let app = App::router_with_options(state_with_store(InMemoryStore::new(), None), options);

    let response = app
        .clone()
        .oneshot(create_request(r#"{"url": "https://example.com/logged"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let slug = json_body(response).await["data"]["slug"]
        .as_str()
        .unwrap()
        .to_owned();
    assert_eq!(slugifier().decode(&slug).unwrap(), (5, 0));

    let response = app.oneshot(get_request(&format!("/{slug}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://example.com/logged"
    );
}

#[tokio::test]
async fn request_logging_keeps_body_errors_as_bad_request() {
    let options = RouterOptions {
        log_requests: true,
        log_elapsed_time: false,
    };
    let app = App::router_with_options(state_with_store(InMemoryStore::new(), None), options);

    let response = app.oneshot(create_request("{")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_error(&json_body(response).await, 400);
}
