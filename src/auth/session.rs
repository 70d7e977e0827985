// Cookie transport for access tokens and the per-request authorization pipeline.
// The token travels in an HTTP-only `access_token` cookie set at login.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::errors::AppError;
use crate::models::user::User;
use crate::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Build the cookie carrying a freshly issued token.
pub fn access_cookie(token: String, ttl: chrono::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// Cookie that makes the browser drop the token. The token itself stays
/// valid until it expires.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(ACCESS_TOKEN_COOKIE).path("/").build()
}

/// Run a request through token validation, user lookup and the key
/// liveness check. The first failing step decides the error.
pub async fn authorize(state: &AppState, jar: &CookieJar) -> Result<User, AppError> {
    let token = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value());
    let claims = state.tokens.validate(token)?;

    let user = state
        .store
        .find_by_id(claims.id)
        .await?
        .ok_or(AppError::UnknownSubject(claims.id))?;

    if !state.validator.check(&user).await? {
        return Err(AppError::KeyExpired);
    }

    Ok(user)
}

/// Extractor for a caller whose token, user row and upstream key all check out.
/// Rejects with the matching `AppError` otherwise.
#[derive(Debug, Clone)]
pub struct AuthorizedUser(pub User);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthorizedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        authorize(state, &jar).await.map(AuthorizedUser)
    }
}
