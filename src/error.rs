use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{models::MessageResponse, repository::RepoError};

/// AuthError
///
/// Failure kinds of the bearer guard. Each one terminates the request immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header on the request.
    #[error("Not authorized, token missing")]
    Missing,
    /// Signature, structure or expiry check failed.
    #[error("Not authorized, token failed")]
    Invalid,
    /// The token is valid but its subject no longer exists.
    #[error("Not authorized, user not found")]
    NotFound,
    /// Authenticated, but the principal lacks the required role.
    #[error("Not authorized as admin")]
    Forbidden,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Missing | AuthError::Invalid | AuthError::NotFound => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

/// ApiError
///
/// The error taxonomy surfaced at the HTTP boundary. Every handler returns
/// `Result<_, ApiError>` and the mapping to status code and JSON body lives here.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input, rejected before reaching storage.
    #[error("{0}")]
    Validation(String),
    /// The id does not resolve to an existing record.
    #[error("{0}")]
    NotFound(&'static str),
    /// A unique constraint would be violated.
    #[error("{0}")]
    Conflict(&'static str),
    /// Login with an unknown email or a wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Uncategorized storage or runtime failure. The message is logged, not returned.
    #[error("{0}")]
    Server(String),
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(_) => ApiError::Conflict("User already exists"),
            other => ApiError::Server(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.to_string()),
            e @ ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::Auth(e) => return e.into_response(),
            ApiError::Server(detail) => {
                // Internal detail stays in the logs; clients get a generic body.
                tracing::error!(error = %detail, "request failed with server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}
