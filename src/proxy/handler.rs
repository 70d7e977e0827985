use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use serde_json::Value;

use super::endpoints::{self, Endpoint};
use crate::auth::AuthorizedUser;
use crate::errors::AppError;
use crate::AppState;

async fn relay(
    state: &AppState,
    user: &AuthorizedUser,
    endpoint: &Endpoint,
    body: Option<Value>,
) -> Result<Response, AppError> {
    let AuthorizedUser(user) = user;
    state.forwarder.forward(user, endpoint, body).await
}

/// An empty or whitespace-only body means "no body". Anything else must be
/// valid JSON; it is rejected here, before any upstream call.
fn parse_body(body: &Bytes) -> Result<Option<Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("request body is not valid JSON: {}", e)))
}

/// POST /create-contact/
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    user: AuthorizedUser,
    body: Bytes,
) -> Result<Response, AppError> {
    let body = parse_body(&body)?;
    relay(&state, &user, &endpoints::CREATE_CONTACT, body).await
}

/// GET /create-contact/
pub async fn contact_stages(
    State(state): State<Arc<AppState>>,
    user: AuthorizedUser,
) -> Result<Response, AppError> {
    relay(&state, &user, &endpoints::CONTACT_STAGES, None).await
}

/// GET /emails/
pub async fn email_accounts(
    State(state): State<Arc<AppState>>,
    user: AuthorizedUser,
) -> Result<Response, AppError> {
    relay(&state, &user, &endpoints::EMAIL_ACCOUNTS, None).await
}

/// POST /create-account/
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    user: AuthorizedUser,
    body: Bytes,
) -> Result<Response, AppError> {
    let body = parse_body(&body)?;
    relay(&state, &user, &endpoints::CREATE_ACCOUNT, body).await
}
