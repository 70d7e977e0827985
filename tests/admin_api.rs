//! Admin API: user registration, key rotation and on-demand checks.

mod common;

use apollo_proxy::store::UserStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn admin_request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-admin-key", ADMIN_KEY)
        .header("content-type", "application/json");
    match body {
        Some(b) => builder.body(Body::from(b.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_admin_requires_key() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri());

    let missing = app
        .send(Request::builder().uri("/api/v1/users").body(Body::empty()).unwrap())
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .send(
            Request::builder()
                .uri("/api/v1/users")
                .header("x-admin-key", "not-the-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let bearer = app
        .send(
            Request::builder()
                .uri("/api/v1/users")
                .header("authorization", format!("Bearer {}", ADMIN_KEY))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(bearer.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_list_and_duplicate() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri());
    let payload = json!({"email": "new@example.com", "api_key": LIVE_KEY});

    let created = app
        .send(admin_request("POST", "/api/v1/users", Some(&payload)))
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let view = body_json(created).await;
    assert_eq!(view["email"], "new@example.com");
    assert!(view.get("api_key").is_none(), "raw key must never be returned");
    assert_eq!(view["api_key_hint"], "****0001");

    let dup = app
        .send(admin_request("POST", "/api/v1/users", Some(&payload)))
        .await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);

    let list = app.send(admin_request("GET", "/api/v1/users", None)).await;
    assert_eq!(list.status(), StatusCode::OK);
    let users = body_json(list).await;
    assert_eq!(users.as_array().map(Vec::len), Some(1));

    // The registered email can now log in.
    let login = app
        .send(post_json("/login/", None, &json!({"email": "new@example.com"})))
        .await;
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejects_invalid_payload() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri());

    let resp = app
        .send(admin_request(
            "POST",
            "/api/v1/users",
            Some(&json!({"email": "no-at-sign", "api_key": "k"})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rotate_key_then_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/health"))
        .and(header("X-Api-Key", LIVE_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_logged_in": true})))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::new(&server.uri());
    let user = app.store.seed("rotate@example.com", DEAD_KEY);
    app.store.set_activity(user.id, false).await.unwrap();

    let rotated = app
        .send(admin_request(
            "PUT",
            &format!("/api/v1/users/{}/api-key", user.id),
            Some(&json!({"api_key": LIVE_KEY})),
        ))
        .await;
    assert_eq!(rotated.status(), StatusCode::OK);

    let checked = app
        .send(admin_request("POST", &format!("/api/v1/users/{}/check", user.id), None))
        .await;
    assert_eq!(checked.status(), StatusCode::OK);
    assert_eq!(body_json(checked).await, json!({"id": user.id, "is_active": true}));

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.api_key, LIVE_KEY);
    assert!(stored.is_active);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri());

    let resp = app
        .send(admin_request(
            "PUT",
            "/api/v1/users/999/api-key",
            Some(&json!({"api_key": "whatever"})),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .send(admin_request("POST", "/api/v1/users/999/check", None))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
