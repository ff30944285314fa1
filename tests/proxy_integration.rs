//! Proxy integration tests
//!
//! These tests drive the relay router directly and stand up a throwaway
//! upstream on a random local port to observe what gets forwarded.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use bridge_stats::proxy::{create_proxy_router, ProxyState};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Requests the fake upstream received: (authorization header, body)
#[derive(Default)]
struct Recorded {
    requests: Mutex<Vec<(Option<String>, Value)>>,
}

impl Recorded {
    fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Helper to start a fake upstream answering every query with a fixed response
async fn spawn_upstream(status: StatusCode, body: &'static str) -> (String, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());

    let app = Router::new()
        .route(
            "/api/v2/query",
            post(
                move |State(recorded): State<Arc<Recorded>>,
                      headers: HeaderMap,
                      Json(payload): Json<Value>| async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    recorded.requests.lock().unwrap().push((auth, payload));
                    (status, body)
                },
            ),
        )
        .with_state(Arc::clone(&recorded));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api/v2/query"), recorded)
}

/// Helper to create the proxy router
fn proxy_app(upstream_url: &str, api_key: Option<&str>) -> Router {
    let state = ProxyState {
        api_key: api_key.map(str::to_string),
        upstream_url: upstream_url.to_string(),
        client: reqwest::Client::new(),
    };
    create_proxy_router(Arc::new(state))
}

fn post_query(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/plausible")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

const QUERY: &str = r#"{"site_id":"bridge.example","metrics":["events"],"date_range":"30d","filters":[["is","event:name",["swap_standard"]]]}"#;

#[tokio::test]
async fn test_preflight_returns_cors_headers_without_body() {
    let app = proxy_app("http://127.0.0.1:9/unused", Some("secret"));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/plausible")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, OPTIONS"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization"
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_other_methods_are_rejected() {
    let app = proxy_app("http://127.0.0.1:9/unused", Some("secret"));

    for method in ["GET", "PUT", "DELETE"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/api/plausible")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["error"], "Method not allowed");
    }
}

#[tokio::test]
async fn test_missing_credential_never_contacts_upstream() {
    let (upstream_url, recorded) = spawn_upstream(StatusCode::OK, r#"{"results":[]}"#).await;
    let app = proxy_app(&upstream_url, None);

    let response = app.oneshot(post_query(QUERY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"], "Plausible API key not configured");
    assert_eq!(recorded.count(), 0);
}

#[tokio::test]
async fn test_non_object_bodies_are_rejected() {
    let (upstream_url, recorded) = spawn_upstream(StatusCode::OK, r#"{"results":[]}"#).await;
    let app = proxy_app(&upstream_url, Some("secret"));

    for body in ["not json", "[1, 2, 3]", "\"text\"", ""] {
        let response = app.clone().oneshot(post_query(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body:?}");
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["error"], "Invalid request body");
    }

    assert_eq!(recorded.count(), 0);
}

#[tokio::test]
async fn test_forwards_body_with_bearer_token() {
    let (upstream_url, recorded) = spawn_upstream(
        StatusCode::OK,
        r#"{"results":[{"metrics":[42],"dimensions":[]}],"meta":{}}"#,
    )
    .await;
    let app = proxy_app(&upstream_url, Some("secret"));

    let response = app.oneshot(post_query(QUERY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["results"][0]["metrics"][0], 42);
    assert_eq!(json["meta"], json!({}));

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("Bearer secret"));
    assert_eq!(requests[0].1, serde_json::from_str::<Value>(QUERY).unwrap());
}

#[tokio::test]
async fn test_upstream_error_status_and_body_are_relayed() {
    let (upstream_url, _) =
        spawn_upstream(StatusCode::BAD_GATEWAY, "bad gateway from upstream").await;
    let app = proxy_app(&upstream_url, Some("secret"));

    let response = app.oneshot(post_query(QUERY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"], "Plausible API error");
    assert_eq!(json["details"], "bad gateway from upstream");
}

#[tokio::test]
async fn test_upstream_client_error_is_relayed() {
    let (upstream_url, _) = spawn_upstream(
        StatusCode::UNAUTHORIZED,
        r#"{"error":"Invalid API key"}"#,
    )
    .await;
    let app = proxy_app(&upstream_url, Some("wrong"));

    let response = app.oneshot(post_query(QUERY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["details"], r#"{"error":"Invalid API key"}"#);
}

#[tokio::test]
async fn test_transport_failure_is_a_generic_500() {
    // Reserve a port, then close it so the connection is refused
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = proxy_app(&format!("http://{addr}/api/v2/query"), Some("secret"));

    let response = app.oneshot(post_query(QUERY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["error"], "Failed to fetch data from Plausible");
    assert!(json["details"].as_str().is_some_and(|d| !d.is_empty()));
}
