use std::time::Duration;

use serde::Deserialize;

const PLACEHOLDER_SECRET: &str = "CHANGE_ME_TOKEN_SIGNING_SECRET";

/// Upper bound for APOLLO_PROXY_TOKEN_TTL_SECS (ten years).
const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 86_400;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// HS256 signing secret for access tokens.
    pub secret_key: String,
    pub admin_key: Option<String>,
    /// Base URL of the Apollo.io API, without a trailing slash.
    pub upstream_url: String,
    pub upstream_timeout_secs: u64,
    pub upstream_connect_timeout_secs: u64,
    /// Lifetime of an issued access token.
    /// Set via APOLLO_PROXY_TOKEN_TTL_SECS. Default: 86400 (1 day).
    pub token_ttl_secs: i64,
    pub cookie_secure: bool,
    /// How long a key-liveness verdict may be reused. 0 = check on every request.
    /// Set via APOLLO_PROXY_KEY_CHECK_TTL_SECS. Default: 0.
    pub key_check_ttl_secs: u64,
}

impl Config {
    /// Returns the admin key for API authentication.
    /// Falls back to secret_key if APOLLO_PROXY_ADMIN_KEY is not set.
    pub fn admin_key(&self) -> &str {
        self.admin_key.as_deref().unwrap_or(&self.secret_key)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.token_ttl_secs.clamp(1, MAX_TOKEN_TTL_SECS))
            .unwrap_or_else(|| chrono::Duration::days(1))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn upstream_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_connect_timeout_secs)
    }

    pub fn key_check_ttl(&self) -> Duration {
        Duration::from_secs(self.key_check_ttl_secs)
    }

    /// Settings for tests and local development: in-memory defaults, upstream at `upstream_url`.
    pub fn for_upstream(upstream_url: &str, secret_key: &str) -> Self {
        Self {
            port: 8000,
            database_url: String::new(),
            secret_key: secret_key.to_string(),
            admin_key: None,
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            upstream_timeout_secs: 30,
            upstream_connect_timeout_secs: 5,
            token_ttl_secs: 86_400,
            cookie_secure: false,
            key_check_ttl_secs: 0,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn check_token_ttl(secs: i64) -> anyhow::Result<i64> {
    if secs <= 0 || secs > MAX_TOKEN_TTL_SECS {
        anyhow::bail!(
            "APOLLO_PROXY_TOKEN_TTL_SECS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_SECS,
            secs
        );
    }
    Ok(secs)
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let secret_key =
        std::env::var("APOLLO_PROXY_SECRET_KEY").unwrap_or_else(|_| PLACEHOLDER_SECRET.into());

    if secret_key == PLACEHOLDER_SECRET {
        let env_mode = std::env::var("APOLLO_PROXY_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "APOLLO_PROXY_SECRET_KEY is still the insecure placeholder. \
                 Set a strong signing secret before running in production."
            );
        }
        eprintln!("APOLLO_PROXY_SECRET_KEY is not set, using insecure placeholder. Set a real secret for production.");
    }

    let token_ttl_secs = check_token_ttl(env_or("APOLLO_PROXY_TOKEN_TTL_SECS", 86_400))?;

    Ok(Config {
        port: env_or("APOLLO_PROXY_PORT", 8000),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/apollo_proxy".into()),
        secret_key,
        admin_key: std::env::var("APOLLO_PROXY_ADMIN_KEY").ok(),
        upstream_url: std::env::var("APOLLO_UPSTREAM_URL")
            .unwrap_or_else(|_| "https://api.apollo.io".into())
            .trim_end_matches('/')
            .to_string(),
        upstream_timeout_secs: env_or("APOLLO_UPSTREAM_TIMEOUT_SECS", 30),
        upstream_connect_timeout_secs: env_or("APOLLO_UPSTREAM_CONNECT_TIMEOUT_SECS", 5),
        token_ttl_secs,
        cookie_secure: env_or("APOLLO_PROXY_COOKIE_SECURE", false),
        key_check_ttl_secs: env_or("APOLLO_PROXY_KEY_CHECK_TTL_SECS", 0),
    })
}
