/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. An `ApiError` renders as a status
/// code plus a JSON body of the form `{"error": "<code>", "message": "..."}`.
/// Internal errors are logged and replaced with a generic message.
///
/// # Example
///
/// ```
/// use coopers_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler(content: Option<String>) -> ApiResult<Json<String>> {
///     let content = content.ok_or_else(|| ApiError::BadRequest("Content is required".into()))?;
///     Ok(Json(content))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coopers_shared::auth::{password::PasswordError, session::SessionError};
use serde::{Deserialize, Serialize};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for every failed login, whatever the cause
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Message returned when registering with an email that is already taken
pub const EMAIL_TAKEN: &str = "Email already registered";

/// Message returned when a username unique violation reaches the store
pub const USERNAME_TAKEN: &str = "Username already taken";

/// Generic message that replaces internal error details
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409) - duplicate email, stale version
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// The one error every failed login produces
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            ApiError::InternalError(detail) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %detail, "Internal error");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg) => msg,
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return match db_err.constraint() {
                    Some(c) if c.contains("email") => ApiError::Conflict(EMAIL_TAKEN.to_string()),
                    Some(c) if c.contains("username") => {
                        ApiError::Conflict(USERNAME_TAKEN.to_string())
                    }
                    _ => ApiError::Conflict("Resource already exists".to_string()),
                };
            }
        }

        ApiError::InternalError(format!("Database error: {}", err))
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert session token errors to API errors
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Expired => ApiError::Unauthorized("Session expired".to_string()),
            SessionError::Invalid(_) => ApiError::Unauthorized("Invalid session".to_string()),
            SessionError::CreateError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert JSON body rejections to 400s
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert validation failures to 400s carrying the first field message
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(coopers_shared::dto::first_message(&errors))
    }
}

/// Convert blocking-task join failures to API errors
impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("Blocking task failed: {}", err))
    }
}
