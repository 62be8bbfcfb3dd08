/// Session tokens
///
/// Login issues a signed, expiring session token (an HS256 JWT). Task
/// endpoints accept it as `Authorization: Bearer <token>` and turn it back
/// into an [`AuthSession`] that handlers read from request extensions.
///
/// The token is the only proof of identity the server trusts; the profile a
/// client caches next to it is informational.
///
/// # Example
///
/// ```
/// use coopers_shared::auth::session::{issue_session, validate_session};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let user_id = Uuid::new_v4();
///
/// let issued = issue_session(user_id, "ada", secret, Duration::hours(24))?;
/// let session = validate_session(&issued.token, secret)?;
/// assert_eq!(session.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every token
pub const ISSUER: &str = "coopers";

/// Error type for session token operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to sign token
    #[error("Failed to create session token: {0}")]
    CreateError(String),

    /// Signature, issuer or format check failed
    #[error("Invalid session token: {0}")]
    Invalid(String),

    /// Token is past its expiry
    #[error("Session has expired")]
    Expired,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Username at issue time
    pub username: String,

    /// Issuer - always [`ISSUER`]
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims valid from now for `ttl`
    pub fn new(user_id: Uuid, username: &str, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            username: username.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token and when it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Encoded JWT
    pub token: String,

    /// Expiry
    pub expires_at: DateTime<Utc>,
}

/// Authenticated caller, inserted into request extensions by the session
/// middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Caller's user ID
    pub user_id: Uuid,

    /// Caller's username
    pub username: String,

    /// When the presented token expires
    pub expires_at: DateTime<Utc>,
}

impl From<Claims> for AuthSession {
    fn from(claims: Claims) -> Self {
        let expires_at = claims.expires_at();
        Self {
            user_id: claims.sub,
            username: claims.username,
            expires_at,
        }
    }
}

/// Signs a session token for a user
///
/// # Errors
///
/// Returns `SessionError::CreateError` if encoding fails
pub fn issue_session(
    user_id: Uuid,
    username: &str,
    secret: &str,
    ttl: Duration,
) -> Result<IssuedSession, SessionError> {
    let claims = Claims::new(user_id, username, ttl);
    let key = EncodingKey::from_secret(secret.as_bytes());

    let token = encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| SessionError::CreateError(format!("Token encoding failed: {}", e)))?;

    Ok(IssuedSession {
        token,
        expires_at: claims.expires_at(),
    })
}

/// Validates a session token
///
/// Checks signature, issuer, expiry and not-before.
///
/// # Errors
///
/// Returns `SessionError::Expired` for an expired token and
/// `SessionError::Invalid` for any other failure
pub fn validate_session(token: &str, secret: &str) -> Result<AuthSession, SessionError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid(e.to_string()),
    })?;

    Ok(AuthSession::from(data.claims))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_issue_and_validate() {
        let user_id = Uuid::new_v4();
        let issued = issue_session(user_id, "ada", SECRET, Duration::hours(24)).unwrap();

        let session = validate_session(&issued.token, SECRET).unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.username, "ada");
        assert_eq!(session.expires_at, issued.expires_at);
        assert!(session.expires_at > Utc::now());
    }

    #[test]
    fn test_expiry_matches_ttl() {
        let issued = issue_session(Uuid::new_v4(), "ada", SECRET, Duration::hours(1)).unwrap();
        let remaining = issued.expires_at - Utc::now();

        assert!(remaining.num_seconds() > 3500);
        assert!(remaining.num_seconds() <= 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = issue_session(Uuid::new_v4(), "ada", SECRET, Duration::hours(1)).unwrap();

        let result = validate_session(&issued.token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued =
            issue_session(Uuid::new_v4(), "ada", SECRET, Duration::seconds(-3600)).unwrap();

        let result = validate_session(&issued.token, SECRET);
        assert!(matches!(result, Err(SessionError::Expired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            validate_session("not-a-token", SECRET),
            Err(SessionError::Invalid(_))
        ));
    }
}
