//! Access tokens: HS256-signed JWTs carrying the user id.
//!
//! Tokens are verified statelessly. The fixed lifetime is the only way a
//! token stops working; there is no revocation list.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::user::User;

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id (primary key of the user row)
    pub id: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no access token presented")]
    MissingCredential,
    #[error("access token has expired")]
    ExpiredCredential,
    #[error("access token is invalid")]
    InvalidCredential,
}

/// Issues and validates access tokens under a single signing secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> anyhow::Result<String> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if the clock read `now`.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> anyhow::Result<String> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("token lifetime overflows the clock"))?;
        let claims = Claims {
            id: user.id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify signature and expiry. Does not check that the user still exists.
    pub fn validate(&self, token: Option<&str>) -> Result<Claims, AuthError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::MissingCredential),
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::ExpiredCredential),
                _ => {
                    tracing::debug!("token rejected: {}", e);
                    Err(AuthError::InvalidCredential)
                }
            },
        }
    }
}
