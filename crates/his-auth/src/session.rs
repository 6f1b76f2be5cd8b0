//! Client-side session state: the bearer token and the user blob.
//!
//! [`SessionStore`] keeps the two fields together and mirrors every change
//! into a [`SessionPersistence`] backend. Persistence failures are logged and
//! otherwise ignored; the in-memory session stays authoritative.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use his_core::User;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::AuthResult;

/// Token and user, always mutated together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "his_token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(rename = "his_user", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Storage backend for the session blob.
pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> AuthResult<Session>;

    fn save(&self, session: &Session) -> AuthResult<()>;
}

/// Session stored as a single JSON document on disk.
///
/// An empty session removes the file.
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> AuthResult<Session> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(e) => {
                return Err(AuthError::storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            AuthError::storage(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn save(&self, session: &Session) -> AuthResult<()> {
        if session.token.is_none() && session.user.is_none() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(AuthError::storage(format!(
                    "failed to remove {}: {e}",
                    self.path.display()
                ))),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let content = serde_json::to_string_pretty(session)
            .map_err(|e| AuthError::storage(format!("failed to serialize session: {e}")))?;
        std::fs::write(&self.path, content).map_err(|e| {
            AuthError::storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

/// Keeps the session in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionPersistence {
    session: Mutex<Session>,
}

impl MemorySessionPersistence {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> AuthResult<Session> {
        Ok(self.session.lock().clone())
    }

    fn save(&self, session: &Session) -> AuthResult<()> {
        *self.session.lock() = session.clone();
        Ok(())
    }
}

/// What the route guard needs from the session owner.
pub trait SessionAccess: Send + Sync {
    fn token(&self) -> Option<String>;

    fn user_role(&self) -> Option<String>;

    /// Clears token and user.
    fn discard(&self);
}

pub struct SessionStore {
    state: RwLock<Session>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl SessionStore {
    /// A store that lives in memory only.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Session::default()),
            persistence: None,
        }
    }

    /// Restores the session from `persistence` and mirrors later changes
    /// into it. An unreadable session starts out signed out.
    pub fn restore(persistence: Arc<dyn SessionPersistence>) -> Self {
        let session = match persistence.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to restore session, starting signed out");
                Session::default()
            }
        };
        // A user without a token is never valid on its own.
        let session = if session.token.is_some() {
            session
        } else {
            Session::default()
        };
        Self {
            state: RwLock::new(session),
            persistence: Some(persistence),
        }
    }

    pub fn login(&self, token: impl Into<String>, user: User) {
        tracing::info!(role = %user.role, "Session started");
        self.replace(Session::new(token, user));
    }

    pub fn logout(&self) {
        if self.state.read().is_authenticated() {
            tracing::info!("Session cleared");
        }
        self.replace(Session::default());
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    fn replace(&self, session: Session) {
        *self.state.write() = session.clone();
        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.save(&session)
        {
            tracing::warn!(error = %e, "Failed to persist session");
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAccess for SessionStore {
    fn token(&self) -> Option<String> {
        SessionStore::token(self)
    }

    fn user_role(&self) -> Option<String> {
        self.state.read().user.as_ref().map(|u| u.role.clone())
    }

    fn discard(&self) {
        self.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use his_core::Role;
    use tempfile::TempDir;

    struct BrokenPersistence;

    impl SessionPersistence for BrokenPersistence {
        fn load(&self) -> AuthResult<Session> {
            Err(AuthError::storage("quota exceeded"))
        }

        fn save(&self, _session: &Session) -> AuthResult<()> {
            Err(AuthError::storage("quota exceeded"))
        }
    }

    fn nurse() -> User {
        User::new(Role::Nurse, "王护士").with_dept("门诊部")
    }

    #[test]
    fn test_login_and_logout() {
        let store = SessionStore::new();
        assert!(store.token().is_none());

        store.login("abc", nurse());
        assert_eq!(store.token().as_deref(), Some("abc"));
        assert_eq!(store.user_role().as_deref(), Some("nurse"));
        assert_eq!(store.user().map(|u| u.name), Some("王护士".to_string()));

        store.discard();
        assert_eq!(store.snapshot(), Session::default());
    }

    #[test]
    fn test_file_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let persistence = Arc::new(FileSessionPersistence::new(dir.path().join("session.json")));

        let store = SessionStore::restore(persistence.clone());
        store.login("tok-1", nurse().with_ids(Some(7), Some(3)));

        let restored = SessionStore::restore(persistence.clone());
        assert_eq!(restored.token().as_deref(), Some("tok-1"));
        assert_eq!(restored.user().and_then(|u| u.user_id), Some(7));

        restored.logout();
        assert!(!persistence.path().exists());
        assert_eq!(persistence.load().unwrap(), Session::default());
    }

    #[test]
    fn test_file_uses_storage_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let persistence = FileSessionPersistence::new(&path);
        persistence.save(&Session::new("t", nurse())).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["his_token"], "t");
        assert_eq!(json["his_user"]["role"], "nurse");
    }

    #[test]
    fn test_corrupt_file_starts_signed_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let persistence = FileSessionPersistence::new(&path);
        assert!(matches!(persistence.load(), Err(AuthError::Storage { .. })));

        let store = SessionStore::restore(Arc::new(persistence));
        assert!(store.token().is_none());
    }

    #[test]
    fn test_user_without_token_is_dropped_on_restore() {
        let persistence = Arc::new(MemorySessionPersistence::new(Session {
            token: None,
            user: Some(nurse()),
        }));
        let store = SessionStore::restore(persistence);
        assert!(store.user().is_none());
    }

    #[test]
    fn test_persistence_failures_are_ignored() {
        let store = SessionStore::restore(Arc::new(BrokenPersistence));
        store.login("abc", nurse());
        assert_eq!(store.token().as_deref(), Some("abc"));
        store.logout();
        assert!(store.token().is_none());
    }
}
