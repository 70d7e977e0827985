//! apollo-proxy: authenticated proxy in front of the Apollo.io CRM API.
//!
//! Callers log in with a registered email and receive an access token cookie.
//! Each protected call re-checks the token, the user row and the user's
//! Apollo key before the request is forwarded upstream with that key.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod proxy;
pub mod store;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use auth::TokenService;
use cache::LivenessCache;
use middleware::metrics::Metrics;
use proxy::forward::Forwarder;
use proxy::liveness::KeyValidator;
use proxy::upstream::UpstreamClient;
use store::UserStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub validator: KeyValidator,
    pub forwarder: Forwarder,
    pub metrics: Metrics,
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config, store: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let metrics = Metrics::new()?;
        let upstream = UpstreamClient::new(
            &config.upstream_url,
            config.upstream_timeout(),
            config.upstream_connect_timeout(),
        )?;
        let cache = LivenessCache::new(config.key_check_ttl());

        Ok(Self {
            tokens: TokenService::new(&config.secret_key, config.token_ttl()),
            validator: KeyValidator::new(upstream.clone(), store.clone(), cache, metrics.clone()),
            forwarder: Forwarder::new(upstream, metrics.clone()),
            store,
            metrics,
            config,
        })
    }
}

/// Build the full HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    let caller_routes = Router::new()
        .route("/login/", post(api::handlers::login))
        .route("/logout/", post(api::handlers::logout))
        .route(
            "/create-contact/",
            post(proxy::handler::create_contact).get(proxy::handler::contact_stages),
        )
        .route("/emails/", get(proxy::handler::email_accounts))
        .route("/create-account/", post(proxy::handler::create_account))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::metrics::track_requests,
        ));

    Router::new()
        // Health endpoints (no auth)
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        .route("/metrics", get(middleware::metrics::metrics_handler))
        .merge(caller_routes)
        // Admin API, nested under /api/v1
        .nest("/api/v1", api::admin_router(state.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            middleware::headers::request_id_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::headers::security_headers_middleware,
        ))
}

async fn readiness_check(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!("readiness check failed: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}
