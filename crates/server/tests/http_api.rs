//! HTTP-level tests against the production router assembly
//! ([`imagedesc_server::routes::build_router`]) via `tower::ServiceExt::oneshot`
//! — no socket is opened, but every layer (security headers, content-type
//! enforcement, rate limiting, CORS) runs exactly as it does in production.

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, StatusCode};
use imagedesc_core::config::Config;
use imagedesc_core::db::Store;
use imagedesc_core::Core;
use serde_json::{json, Value};
use tower::ServiceExt;

static ENV_INIT: Once = Once::new();

fn set_test_env(database_url: &str) {
    ENV_INIT.call_once(|| {
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::set_var("MIN_WORD_COUNT", "5");
        std::env::set_var("TOO_FAST_SECONDS", "2");
        std::env::set_var("IP_HASH_SALT", "test-salt");
        std::env::set_var("PAYMENT_REQUIRED", "false");
        std::env::set_var("REWARD_AMOUNT", "10");
        std::env::set_var("REWARD_COOLDOWN_SECONDS", "86400");
    });
    std::env::set_var("DATABASE_URL", database_url);
}

/// Builds the production router against `TEST_DATABASE_URL`, or returns
/// `None` so the calling test can skip — these are integration tests, not
/// unit tests, and need a real Postgres instance (SPEC_FULL.md §4.14).
async fn test_app() -> Option<axum::Router> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
    set_test_env(&database_url);

    let store = Store::connect(&database_url).await.expect("connect to test database");
    store.migrate().await.expect("run migrations");
    let config = Config::from_env().expect("build config from env");
    let core = Arc::new(Core::new(store, config));

    let app = imagedesc_server::routes::build_router(core);
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    Some(app.layer(MockConnectInfo(addr)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let Some(app) = test_app().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let response = app.oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_is_idempotent_and_detects_conflicting_replay() {
    let Some(app) = test_app().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let payload = json!({
        "participant_id": "p-http-idem",
        "session_id": "s-http-idem",
        "username": "alice",
        "email": "alice@example.com",
        "age": 28,
    });

    let first = app.clone().oneshot(json_request("POST", "/api/participants", payload.clone())).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(json_request("POST", "/api/participants", payload.clone())).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK, "identical re-registration must be idempotent");

    let mut conflicting = payload.clone();
    conflicting["email"] = json!("mallory@example.com");
    let third = app.oneshot(json_request("POST", "/api/participants", conflicting)).await.unwrap();
    assert_eq!(third.status(), StatusCode::CONFLICT, "diverging re-registration must conflict");
}

#[tokio::test]
async fn missing_content_type_is_rejected_on_post() {
    let Some(app) = test_app().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let request = Request::builder()
        .method("POST")
        .uri("/api/participants")
        .body(Body::from(json!({ "participant_id": "p-no-ct" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn security_headers_are_present_on_every_response() {
    let Some(app) = test_app().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let response = app.oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap()).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("x-correlation-id"));
}

#[tokio::test]
async fn submission_below_minimum_word_count_is_rejected() {
    let Some(app) = test_app().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let registration = json!({
        "participant_id": "p-http-submit",
        "session_id": "s-http-submit",
        "username": "bob",
        "email": "bob@example.com",
        "age": 40,
    });
    let register_response =
        app.clone().oneshot(json_request("POST", "/api/participants", registration)).await.unwrap();
    assert_eq!(register_response.status(), StatusCode::OK);

    let consent = json!({ "participant_id": "p-http-submit", "consent_given": true });
    let consent_response = app.clone().oneshot(json_request("POST", "/api/consent", consent)).await.unwrap();
    assert_eq!(consent_response.status(), StatusCode::OK);

    let submission = json!({
        "participant_id": "p-http-submit",
        "session_id": "s-http-submit",
        "image_id": "survey/http-test.svg",
        "image_url": "/api/images/survey/http-test.svg",
        "description": "too short",
        "rating": 5,
        "time_spent_seconds": 30,
        "is_survey": true,
        "is_attention": false,
    });
    let submit_response = app.oneshot(json_request("POST", "/api/submit", submission)).await.unwrap();
    assert_eq!(submit_response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(submit_response).await;
    assert!(body["error"].as_str().unwrap().contains("words required"));
}

#[tokio::test]
async fn reward_select_is_rate_limited_past_its_quota() {
    let Some(app) = test_app().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };

    let registration = json!({
        "participant_id": "p-http-ratelimit",
        "session_id": "s-http-ratelimit",
        "username": "carol",
        "email": "carol@example.com",
        "age": 22,
    });
    let register_response =
        app.clone().oneshot(json_request("POST", "/api/participants", registration)).await.unwrap();
    assert_eq!(register_response.status(), StatusCode::OK);

    // RewardSelect quota is 10/minute (imagedesc_core::ratelimit::LimitedEndpoint::RewardSelect).
    let mut last_status = StatusCode::OK;
    for _ in 0..11 {
        let request = Request::builder()
            .method("POST")
            .uri("/api/reward/select/p-http-ratelimit")
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap();
        last_status = app.clone().oneshot(request).await.unwrap().status();
    }
    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);
}
