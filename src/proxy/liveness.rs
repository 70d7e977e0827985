use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde_json::Value;

use super::upstream::UpstreamClient;
use crate::cache::LivenessCache;
use crate::errors::AppError;
use crate::middleware::metrics::Metrics;
use crate::models::user::User;
use crate::store::UserStore;

pub const HEALTH_PATH: &str = "/v1/auth/health";

/// Confirms a stored Apollo key is still accepted upstream and records the
/// verdict on the user row.
#[derive(Clone)]
pub struct KeyValidator {
    upstream: UpstreamClient,
    store: Arc<dyn UserStore>,
    cache: LivenessCache,
    metrics: Metrics,
}

impl KeyValidator {
    pub fn new(
        upstream: UpstreamClient,
        store: Arc<dyn UserStore>,
        cache: LivenessCache,
        metrics: Metrics,
    ) -> Self {
        Self {
            upstream,
            store,
            cache,
            metrics,
        }
    }

    pub fn cache(&self) -> &LivenessCache {
        &self.cache
    }

    /// Returns whether the user's key is live.
    ///
    /// Valid means HTTP 200 with a truthy `is_logged_in` field; any other
    /// status or body is a dead key. Transport failures are returned as
    /// `UpstreamUnreachable` and leave `is_active` untouched.
    #[tracing::instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn check(&self, user: &User) -> Result<bool, AppError> {
        if let Some(active) = self.cache.get(user) {
            self.metrics
                .record_key_check(if active { "cached_valid" } else { "cached_invalid" });
            return Ok(active);
        }

        let resp = match self
            .upstream
            .send(Method::GET, HEALTH_PATH, &user.api_key, None)
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                self.metrics.record_key_check("error");
                return Err(e);
            }
        };

        let status = resp.status();
        let active = if status == StatusCode::OK {
            match resp.json::<Value>().await {
                Ok(body) => is_truthy(body.get("is_logged_in")),
                Err(e) => {
                    tracing::debug!("health body unreadable: {}", e);
                    false
                }
            }
        } else {
            false
        };

        self.store.set_activity(user.id, active).await?;
        self.cache.put(user, active);

        if active {
            self.metrics.record_key_check("valid");
        } else {
            tracing::info!(status = status.as_u16(), key = %user.api_key_hint(), "API key rejected by upstream");
            self.metrics.record_key_check("invalid");
        }
        Ok(active)
    }
}

/// JSON truthiness: false, null, 0, "", [] and {} are falsy.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
