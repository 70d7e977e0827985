//! Prometheus metrics for the proxy.
//!
//! Exposes a standard `/metrics` endpoint that Prometheus can scrape.
//! Request counts are recorded by `track_requests`, upstream timings by the
//! forwarder, key checks by the key validator.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{
    histogram_opts, opts, CounterVec, Encoder, HistogramVec, Registry, TextEncoder,
};

use crate::AppState;

/// Metric handles registered in a registry owned by this recorder,
/// so several app instances (e.g. in tests) can coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: CounterVec,
    request_duration_seconds: HistogramVec,
    upstream_duration_seconds: HistogramVec,
    key_checks_total: CounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            opts!("apollo_proxy_requests_total", "Total number of handled requests"),
            &["route", "status_code"],
        )?;
        let request_duration_seconds = HistogramVec::new(
            histogram_opts!(
                "apollo_proxy_request_duration_seconds",
                "End-to-end request latency in seconds",
                vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
            ),
            &["route"],
        )?;
        let upstream_duration_seconds = HistogramVec::new(
            histogram_opts!(
                "apollo_proxy_upstream_duration_seconds",
                "Latency of calls to the Apollo API in seconds",
                vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
            ),
            &["endpoint"],
        )?;
        let key_checks_total = CounterVec::new(
            opts!("apollo_proxy_key_checks_total", "API key liveness checks by result"),
            &["result"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(upstream_duration_seconds.clone()))?;
        registry.register(Box::new(key_checks_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
            upstream_duration_seconds,
            key_checks_total,
        })
    }

    pub fn record_request(&self, route: &str, status: u16, elapsed_secs: f64) {
        self.requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[route])
            .observe(elapsed_secs);
    }

    pub fn record_upstream(&self, endpoint: &str, elapsed_secs: f64) {
        self.upstream_duration_seconds
            .with_label_values(&[endpoint])
            .observe(elapsed_secs);
    }

    /// `result` is one of `valid`, `invalid`, `cached_valid`, `cached_invalid`, `error`.
    pub fn record_key_check(&self, result: &str) {
        self.key_checks_total.with_label_values(&[result]).inc();
    }

    pub fn key_checks(&self, result: &str) -> u64 {
        self.key_checks_total.with_label_values(&[result]).get() as u64
    }

    /// Encode all metrics in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Middleware: counts every request by matched route and final status.
/// Unmatched paths are bucketed under "unmatched" to bound label cardinality.
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let resp = next.run(req).await;

    state
        .metrics
        .record_request(&route, resp.status().as_u16(), start.elapsed().as_secs_f64());
    resp
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
