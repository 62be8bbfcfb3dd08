/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`session`]: Signed, expiring session tokens issued at login
///
/// # Example
///
/// ```no_run
/// use coopers_shared::auth::password::{hash_password, verify_password};
/// use coopers_shared::auth::session::issue_session;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let session = issue_session(Uuid::new_v4(), "ada", "secret-key", Duration::hours(24))?;
/// println!("token expires at {}", session.expires_at);
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod session;
