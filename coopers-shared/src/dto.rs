/// Wire types shared by the API server and the client
///
/// Request bodies use `Option` for every field so a missing field reaches the
/// validator (and becomes a 400) instead of failing JSON extraction. All
/// names are camelCase on the wire.

use crate::models::user::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

/// Message used when any registration field is missing or blank
pub const MISSING_REGISTRATION_FIELDS: &str = "All fields are required";

/// Message used when a login field is missing or blank
pub const MISSING_LOGIN_FIELDS: &str = "Username and password are required";

/// Register request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(
        required(message = "All fields are required"),
        length(min = 1, message = "All fields are required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,

    /// Login handle
    #[validate(
        required(message = "All fields are required"),
        length(min = 1, max = 64, message = "All fields are required")
    )]
    pub username: Option<String>,

    /// Plaintext password (hashed before storage, never echoed)
    #[validate(
        required(message = "All fields are required"),
        length(min = 1, message = "All fields are required")
    )]
    pub password: Option<String>,
}

/// Register response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// Confirmation text
    pub message: String,

    /// ID of the new user
    pub user_id: Uuid,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login handle
    #[validate(
        required(message = "Username and password are required"),
        length(min = 1, message = "Username and password are required")
    )]
    pub username: Option<String>,

    /// Plaintext password
    #[validate(
        required(message = "Username and password are required"),
        length(min = 1, message = "Username and password are required")
    )]
    pub password: Option<String>,
}

/// Login response: the public profile plus a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Public profile (never contains the password hash)
    #[serde(flatten)]
    pub profile: UserProfile,

    /// Bearer token for task endpoints
    pub token: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Availability check request; at least one field must be non-empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// Username to look up
    pub username: Option<String>,

    /// Email to look up
    pub email: Option<String>,
}

impl AvailabilityRequest {
    /// Username, if given and non-empty
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|s| !s.is_empty())
    }

    /// Email, if given and non-empty
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.is_empty())
    }

    /// Whether there is anything to look up
    pub fn is_empty(&self) -> bool {
        self.username().is_none() && self.email().is_none()
    }
}

/// Availability check response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Whether any given field matches an existing user
    pub exists: bool,
}

/// Create todo request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    /// Todo text
    #[validate(
        required(message = "Content and user id are required"),
        length(min = 1, message = "Content and user id are required")
    )]
    pub content: Option<String>,

    /// Initial completion flag, `false` when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    /// Owner; must be the authenticated caller
    #[validate(required(message = "Content and user id are required"))]
    pub user_id: Option<Uuid>,
}

/// Update todo request (partial)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UpdateTodoRequest {
    /// Todo to update
    #[validate(required(message = "Todo id is required"))]
    pub id: Option<Uuid>,

    /// New text, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,

    /// New completion flag, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    /// Version last seen by the caller; omit for last-writer-wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

impl UpdateTodoRequest {
    /// Whether the request changes at least one field
    pub fn has_changes(&self) -> bool {
        self.content.is_some() || self.completed.is_some()
    }
}

/// Collapses validation errors into one human-readable message
///
/// Fields are visited in name order so the message is stable.
pub fn first_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().collect();
    fields.sort();

    fields
        .into_iter()
        .filter_map(|field| field_errors.get(field))
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Validation failed".to_string())
}
