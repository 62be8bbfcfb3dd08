/// Cached login session
///
/// After login the client keeps the profile and session token under a
/// fixed key (`userData`). A cached session only counts as logged in while
/// its token is unexpired; the server re-validates the token on every call.
///
/// Two caches are provided:
///
/// - [`MemorySessionCache`]: process-local, for tests and short-lived tools
/// - [`FileSessionCache`]: a JSON object on disk, `{"userData": {...}}`

use crate::api::ClientError;
use chrono::{DateTime, Utc};
use coopers_shared::{dto::LoginResponse, models::user::UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Key the session is stored under
pub const SESSION_KEY: &str = "userData";

/// A logged-in user's profile and token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Public profile returned by login
    #[serde(flatten)]
    pub profile: UserProfile,

    /// Bearer token for task endpoints
    pub token: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Logged-in user's ID
    pub fn user_id(&self) -> Uuid {
        self.profile.id
    }

    /// Whether the token has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl From<LoginResponse> for Session {
    fn from(login: LoginResponse) -> Self {
        Self {
            profile: login.profile,
            token: login.token,
            expires_at: login.expires_at,
        }
    }
}

/// Storage for the current session
pub trait SessionCache: Send + Sync {
    /// Saves the session, replacing any previous one
    fn store(&self, session: &Session) -> Result<(), ClientError>;

    /// Reads the stored session, expired or not
    fn load(&self) -> Result<Option<Session>, ClientError>;

    /// Removes the stored session
    fn clear(&self) -> Result<(), ClientError>;

    /// The stored session if it is still valid
    ///
    /// An expired session is cleared.
    fn current(&self) -> Result<Option<Session>, ClientError> {
        match self.load()? {
            Some(session) if session.is_expired() => {
                tracing::debug!(user_id = %session.user_id(), "Cached session expired");
                self.clear()?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Whether a valid session is cached
    fn is_logged_in(&self) -> Result<bool, ClientError> {
        Ok(self.current()?.is_some())
    }

    /// Forgets the session
    fn logout(&self) -> Result<(), ClientError> {
        tracing::info!("Logging out");
        self.clear()
    }
}

/// In-memory session cache
#[derive(Debug, Default)]
pub struct MemorySessionCache {
    session: Mutex<Option<Session>>,
}

impl MemorySessionCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Option<Session>) -> T) -> Result<T, ClientError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| ClientError::Cache("session lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

impl SessionCache for MemorySessionCache {
    fn store(&self, session: &Session) -> Result<(), ClientError> {
        self.with(|slot| *slot = Some(session.clone()))
    }

    fn load(&self) -> Result<Option<Session>, ClientError> {
        self.with(|slot| slot.clone())
    }

    fn clear(&self) -> Result<(), ClientError> {
        self.with(|slot| *slot = None)
    }
}

/// Session cache backed by a JSON file
///
/// Other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    /// Uses the JSON file at `path`; it is created on first store
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, ClientError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(cache_error(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&contents).map_err(|e| cache_error(&self.path, e))
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| cache_error(parent, e))?;
        }

        let contents = serde_json::to_string_pretty(map).map_err(|e| cache_error(&self.path, e))?;
        std::fs::write(&self.path, contents).map_err(|e| cache_error(&self.path, e))
    }
}

fn cache_error(path: &Path, err: impl std::fmt::Display) -> ClientError {
    ClientError::Cache(format!("{}: {}", path.display(), err))
}

impl SessionCache for FileSessionCache {
    fn store(&self, session: &Session) -> Result<(), ClientError> {
        let mut map = self.read_map()?;
        let value = serde_json::to_value(session).map_err(|e| cache_error(&self.path, e))?;
        map.insert(SESSION_KEY.to_string(), value);
        self.write_map(&map)
    }

    fn load(&self) -> Result<Option<Session>, ClientError> {
        let mut map = self.read_map()?;

        match map.remove(SESSION_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| cache_error(&self.path, e)),
        }
    }

    fn clear(&self) -> Result<(), ClientError> {
        let mut map = self.read_map()?;
        if map.remove(SESSION_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration) -> Session {
        Session {
            profile: UserProfile {
                id: Uuid::new_v4(),
                username: "a".to_string(),
                email: "a@x.com".to_string(),
                created_at: Utc::now(),
            },
            token: "tok".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    fn temp_file() -> PathBuf {
        std::env::temp_dir()
            .join(format!("coopers-session-{}", Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemorySessionCache::new();
        assert!(!cache.is_logged_in().unwrap());

        let s = session(Duration::hours(1));
        cache.store(&s).unwrap();
        assert_eq!(cache.current().unwrap(), Some(s));

        cache.logout().unwrap();
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_expired_session_is_not_current() {
        let cache = MemorySessionCache::new();
        cache.store(&session(Duration::seconds(-1))).unwrap();

        assert!(cache.current().unwrap().is_none());
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_session_serializes_flat_camel_case() {
        let value = serde_json::to_value(session(Duration::hours(1))).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("expiresAt").is_some());
        assert_eq!(value["username"], "a");
        assert!(value.get("profile").is_none());
    }

    #[test]
    fn test_file_cache_uses_user_data_key() {
        let path = temp_file();
        let cache = FileSessionCache::new(&path);
        let s = session(Duration::hours(1));

        cache.store(&s).unwrap();
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[SESSION_KEY]["token"], "tok");

        let reopened = FileSessionCache::new(&path);
        assert_eq!(reopened.current().unwrap(), Some(s));

        reopened.logout().unwrap();
        assert!(reopened.load().unwrap().is_none());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_file_cache_preserves_other_keys() {
        let path = temp_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let cache = FileSessionCache::new(&path);
        cache.store(&session(Duration::hours(1))).unwrap();
        cache.clear().unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert!(raw.get(SESSION_KEY).is_none());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_file_cache_missing_file_is_logged_out() {
        let cache = FileSessionCache::new(temp_file());
        assert!(!cache.is_logged_in().unwrap());
    }

    #[test]
    fn test_file_cache_corrupt_file_errors() {
        let path = temp_file();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let cache = FileSessionCache::new(&path);
        assert!(matches!(cache.load(), Err(ClientError::Cache(_))));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
