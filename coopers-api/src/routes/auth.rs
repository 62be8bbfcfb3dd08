/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Create an account
/// - `POST /v1/auth/login` - Verify credentials and open a session
/// - `POST /v1/auth/availability` - Advisory username/email lookup
///
/// Every login failure (unknown username, account without a password,
/// wrong password) produces the same 401 body so callers cannot tell which
/// usernames exist.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, EMAIL_TAKEN},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use coopers_shared::{
    auth::{password, session},
    dto::{
        AvailabilityRequest, AvailabilityResponse, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse, MISSING_LOGIN_FIELDS, MISSING_REGISTRATION_FIELDS,
    },
    models::user::{CreateUser, User},
};
use validator::Validate;

/// Register endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "a@x.com",
///   "username": "a",
///   "password": "secret1"
/// }
/// ```
///
/// # Response
///
/// ```json
/// HTTP/1.1 201 Created
///
/// {
///   "message": "User created successfully",
///   "userId": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: A field is missing or blank
/// - `409 Conflict`: Email (or, on a race, username) already registered
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let (Some(email), Some(username), Some(plaintext)) = (req.email, req.username, req.password)
    else {
        return Err(ApiError::BadRequest(MISSING_REGISTRATION_FIELDS.to_string()));
    };

    if User::email_exists(&state.db, &email).await? {
        tracing::info!("Registration rejected: email already registered");
        return Err(ApiError::Conflict(EMAIL_TAKEN.to_string()));
    }

    // Argon2 is CPU-bound; keep it off the async workers
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext)).await??;

    let user = User::create(
        &state.db,
        CreateUser {
            username,
            email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "username": "a",
///   "password": "secret1"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": "uuid",
///   "username": "a",
///   "email": "a@x.com",
///   "createdAt": "2025-01-01T00:00:00Z",
///   "token": "eyJ...",
///   "expiresAt": "2025-01-02T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: A field is missing or blank
/// - `401 Unauthorized`: Invalid username or password
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let (Some(username), Some(plaintext)) = (req.username, req.password) else {
        return Err(ApiError::BadRequest(MISSING_LOGIN_FIELDS.to_string()));
    };

    let Some(user) = User::find_by_username(&state.db, &username).await? else {
        tracing::debug!("Login failed: unknown username");
        return Err(ApiError::invalid_credentials());
    };

    let Some(stored_hash) = user.password_hash.clone() else {
        tracing::debug!(user_id = %user.id, "Login failed: account has no password");
        return Err(ApiError::invalid_credentials());
    };

    let valid = tokio::task::spawn_blocking(move || {
        password::verify_password(&plaintext, &stored_hash)
    })
    .await??;

    if !valid {
        tracing::debug!(user_id = %user.id, "Login failed: wrong password");
        return Err(ApiError::invalid_credentials());
    }

    let issued = session::issue_session(
        user.id,
        &user.username,
        state.session_secret(),
        state.session_ttl(),
    )?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        profile: user.profile(),
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// Availability check endpoint
///
/// Looks up the username first, then the email. Advisory only: registration
/// still enforces uniqueness.
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/availability
/// Content-Type: application/json
///
/// { "username": "a" }
/// ```
///
/// # Response
///
/// ```json
/// { "exists": true }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Neither field given
/// - `500 Internal Server Error`: Server error
pub async fn check_availability(
    State(state): State<AppState>,
    payload: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let Json(req) = payload?;

    if req.is_empty() {
        return Err(ApiError::BadRequest(
            "Username or email is required".to_string(),
        ));
    }

    if let Some(username) = req.username() {
        if User::username_exists(&state.db, username).await? {
            return Ok(Json(AvailabilityResponse { exists: true }));
        }
    }

    if let Some(email) = req.email() {
        if User::email_exists(&state.db, email).await? {
            return Ok(Json(AvailabilityResponse { exists: true }));
        }
    }

    Ok(Json(AvailabilityResponse { exists: false }))
}
