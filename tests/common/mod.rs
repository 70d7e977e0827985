#![allow(dead_code)]

use std::sync::Arc;

use apollo_proxy::config::Config;
use apollo_proxy::models::user::User;
use apollo_proxy::store::memory::MemoryStore;
use apollo_proxy::{app, AppState};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";
pub const ADMIN_KEY: &str = "integration-admin-key";
pub const LIVE_KEY: &str = "live-apollo-key-0001";
pub const DEAD_KEY: &str = "dead-apollo-key-0002";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new(upstream_url: &str) -> Self {
        Self::with_config(Config::for_upstream(upstream_url, SECRET))
    }

    pub fn with_config(mut config: Config) -> Self {
        config.admin_key = Some(ADMIN_KEY.to_string());
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new(config, store.clone()).unwrap());
        let router = app(state.clone());
        Self {
            state,
            store,
            router,
        }
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.issue(user).unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("cookie", format!("access_token={}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("cookie", format!("access_token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

pub async fn body_text(resp: Response<Body>) -> String {
    String::from_utf8(body_bytes(resp).await).unwrap()
}
