use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::token::AuthError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing credential")]
    MissingCredential,

    #[error("credential expired")]
    ExpiredCredential,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("token subject {0} does not exist")]
    UnknownSubject(i64),

    #[error("login requires an email address")]
    MissingEmail,

    #[error("user not found")]
    UserNotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("API key has been expired")]
    KeyExpired,

    #[error("failed to connect to Apollo API: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream rejected request with {status}: {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("upstream returned a malformed body: {0}")]
    UpstreamMalformed(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => AppError::MissingCredential,
            AuthError::ExpiredCredential => AppError::ExpiredCredential,
            AuthError::InvalidCredential => AppError::InvalidCredential,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential
            | AppError::ExpiredCredential
            | AppError::InvalidCredential
            | AppError::UnknownSubject(_)
            | AppError::KeyExpired => StatusCode::UNAUTHORIZED,
            AppError::MissingEmail | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::UpstreamUnreachable(_) | AppError::UpstreamMalformed(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used in logs and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingCredential => "missing_credential",
            AppError::ExpiredCredential => "expired_credential",
            AppError::InvalidCredential => "invalid_credential",
            AppError::UnknownSubject(_) => "unknown_subject",
            AppError::MissingEmail => "missing_email",
            AppError::UserNotFound => "user_not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::KeyExpired => "key_expired",
            AppError::UpstreamUnreachable(_) => "upstream_unreachable",
            AppError::UpstreamRejected { .. } => "upstream_rejected",
            AppError::UpstreamMalformed(_) => "upstream_malformed",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_server_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (error_type, msg) = match &self {
            AppError::MissingCredential => (
                "authentication_error",
                "you cannot do this without logging in, login first".to_string(),
            ),
            AppError::ExpiredCredential => (
                "authentication_error",
                "token has expired, please log in again".to_string(),
            ),
            AppError::InvalidCredential => (
                "authentication_error",
                "invalid token, please log in again".to_string(),
            ),
            AppError::UnknownSubject(id) => {
                tracing::warn!(user_id = id, "token refers to a user that no longer exists");
                (
                    "authentication_error",
                    "user not found, please log in again".to_string(),
                )
            }
            AppError::MissingEmail => (
                "invalid_request_error",
                "login requires an email address, please enter your email address".to_string(),
            ),
            AppError::UserNotFound => (
                "not_found_error",
                "you are not registered in the system, please contact tech support".to_string(),
            ),
            AppError::BadRequest(e) => ("invalid_request_error", e.clone()),
            AppError::KeyExpired => ("authentication_error", "API key has been expired".to_string()),
            AppError::UpstreamUnreachable(e) => (
                "upstream_error",
                format!("Failed to connect to Apollo API: {}", e),
            ),
            AppError::UpstreamRejected { message, .. } => ("upstream_error", message.clone()),
            AppError::UpstreamMalformed(e) => {
                tracing::warn!("Malformed upstream body: {}", e);
                (
                    "upstream_error",
                    "Apollo API returned a malformed response".to_string(),
                )
            }
            AppError::Conflict(e) => ("invalid_request_error", e.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ("internal_error", "internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": self.code(),
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_are_unauthenticated() {
        for err in [
            AppError::MissingCredential,
            AppError::ExpiredCredential,
            AppError::InvalidCredential,
            AppError::UnknownSubject(7),
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{}", err);
        }
    }

    #[test]
    fn test_upstream_rejected_passes_status_through() {
        let err = AppError::UpstreamRejected {
            status: 422,
            message: "Failed to create contact".into(),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_upstream_rejected_with_bogus_status_is_bad_gateway() {
        let err = AppError::UpstreamRejected {
            status: 42,
            message: "Failed".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_upstream_rejected_non_error_status_passes_through() {
        let err = AppError::UpstreamRejected {
            status: 201,
            message: "Failed to create an account".into(),
        };
        assert_eq!(err.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_unreachable_is_gateway_failure() {
        let err = AppError::UpstreamUnreachable("connection refused".into());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_auth_error_conversion() {
        assert!(matches!(
            AppError::from(AuthError::ExpiredCredential),
            AppError::ExpiredCredential
        ));
        assert!(matches!(
            AppError::from(AuthError::InvalidCredential),
            AppError::InvalidCredential
        ));
    }
}
