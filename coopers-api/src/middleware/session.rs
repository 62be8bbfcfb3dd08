/// Bearer session authentication
///
/// Reads `Authorization: Bearer <token>`, validates the session token and
/// inserts the resulting [`AuthSession`] into request extensions. Handlers
/// behind this layer take `Extension<AuthSession>`.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use coopers_shared::auth::session::{validate_session, AuthSession};

/// Extracts the token from an `Authorization` header value
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Session authentication middleware
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    let token = bearer_token(header)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let session: AuthSession = validate_session(token, state.session_secret())?;
    tracing::debug!(user_id = %session.user_id, "Session accepted");

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }
}
