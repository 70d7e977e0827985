//! HTTP client for calls to the Apollo.io API.
//! Every call carries the caller's own key in `X-Api-Key`. Failures are
//! reported once; nothing here retries.

use std::error::Error as StdError;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;

use crate::errors::AppError;

pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(default_headers)
            .pool_max_idle_per_host(32)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        api_key: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, AppError> {
        let key = HeaderValue::from_str(api_key).map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "stored API key contains characters not allowed in a header"
            ))
        })?;

        let mut req = self
            .client
            .request(method, self.url(path))
            .header(API_KEY_HEADER, key);
        if let Some(body) = body {
            req = req.json(body);
        }

        req.send().await.map_err(|e| {
            let text = error_chain(&e);
            tracing::warn!(path = %path, "Upstream request failed: {}", text);
            AppError::UpstreamUnreachable(text)
        })
    }
}

/// Flatten an error and its sources into one line, e.g.
/// `error sending request for url (...): client error (Connect): tcp connect error: Connection refused`.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
