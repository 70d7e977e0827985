use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use super::endpoints::{Endpoint, SuccessBody};
use super::upstream::{error_chain, UpstreamClient};
use crate::errors::AppError;
use crate::middleware::metrics::Metrics;
use crate::models::user::User;

/// Sends an authorized caller's request to Apollo and translates the outcome.
#[derive(Clone)]
pub struct Forwarder {
    upstream: UpstreamClient,
    metrics: Metrics,
}

impl Forwarder {
    pub fn new(upstream: UpstreamClient, metrics: Metrics) -> Self {
        Self { upstream, metrics }
    }

    /// Only an upstream 200 counts as success; any other status is passed
    /// through with the endpoint's failure message. Transport failures
    /// become `UpstreamUnreachable` carrying the error text.
    #[tracing::instrument(skip(self, user, body), fields(user_id = user.id, endpoint = endpoint.name))]
    pub async fn forward(
        &self,
        user: &User,
        endpoint: &Endpoint,
        body: Option<Value>,
    ) -> Result<Response, AppError> {
        let body = if endpoint.sends_body() {
            Some(body.unwrap_or_else(|| Value::Object(Default::default())))
        } else {
            None
        };

        let start = Instant::now();
        let resp = self
            .upstream
            .send(endpoint.method.clone(), endpoint.path, &user.api_key, body.as_ref())
            .await;
        self.metrics
            .record_upstream(endpoint.name, start.elapsed().as_secs_f64());
        let resp = resp?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            tracing::info!(status = status.as_u16(), "upstream rejected request");
            return Err(AppError::UpstreamRejected {
                status: status.as_u16(),
                message: endpoint.failure_message.to_string(),
            });
        }

        match endpoint.success {
            SuccessBody::Raw { prefix } => {
                let text = resp
                    .text()
                    .await
                    .map_err(|e| AppError::UpstreamMalformed(error_chain(&e)))?;
                Ok((StatusCode::OK, format!("{}\n{}", prefix, text)).into_response())
            }
            SuccessBody::Json => {
                let value: Value = resp
                    .json()
                    .await
                    .map_err(|e| AppError::UpstreamMalformed(error_chain(&e)))?;
                Ok((StatusCode::OK, Json(value)).into_response())
            }
        }
    }
}
