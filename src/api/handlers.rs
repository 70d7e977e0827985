use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::session;
use crate::errors::AppError;
use crate::models::user::{NewUser, UserView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
}

/// POST /login/: exchange a registered email for an access token cookie.
#[tracing::instrument(skip(state, jar, body))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Option<Json<LoginRequest>>,
) -> Result<(CookieJar, Json<Value>), AppError> {
    let email = body
        .and_then(|Json(b)| b.email)
        .filter(|e| !e.is_empty())
        .ok_or(AppError::MissingEmail)?;

    let user = state
        .store
        .find_by_email(&email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let token = state.tokens.issue(&user)?;
    tracing::info!(user_id = user.id, "user logged in");

    let cookie = session::access_cookie(token, state.tokens.ttl(), state.config.cookie_secure);
    Ok((
        jar.add(cookie),
        Json(json!({ "message": "You have successfully logged in" })),
    ))
}

/// POST /logout/: drop the token cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (
        jar.remove(session::removal_cookie()),
        Json(json!({ "message": "You have been logged out" })),
    )
}

// -- Admin: user registry --

/// GET /api/v1/users
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserView>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

/// POST /api/v1/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    validate_new_user(&payload)?;

    let user = state
        .store
        .insert_user(&payload)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("email '{}' is already registered", payload.email)))?;

    tracing::info!(user_id = user.id, key = %user.api_key_hint(), "registered user");
    Ok((StatusCode::CREATED, Json(UserView::from(&user))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateKeyRequest {
    pub api_key: String,
}

/// PUT /api/v1/users/:id/api-key
pub async fn update_api_key(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateKeyRequest>,
) -> Result<Json<UserView>, AppError> {
    if payload.api_key.trim().is_empty() {
        return Err(AppError::BadRequest("api_key must not be empty".into()));
    }
    if !state.store.update_api_key(id, &payload.api_key).await? {
        return Err(AppError::UserNotFound);
    }
    state.validator.cache().invalidate(id);

    let user = state
        .store
        .find_by_id(id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(UserView::from(&user)))
}

/// POST /api/v1/users/:id/check: run a liveness check now.
pub async fn check_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .store
        .find_by_id(id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    state.validator.cache().invalidate(id);

    let active = state.validator.check(&user).await?;
    Ok(Json(json!({ "id": user.id, "is_active": active })))
}

fn validate_new_user(user: &NewUser) -> Result<(), AppError> {
    if user.email.is_empty() {
        return Err(AppError::MissingEmail);
    }
    if !user.email.contains('@') {
        return Err(AppError::BadRequest(format!("'{}' is not an email address", user.email)));
    }
    if user.api_key.trim().is_empty() {
        return Err(AppError::BadRequest("api_key must not be empty".into()));
    }
    Ok(())
}
