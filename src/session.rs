use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::saving;

/// Default session lifetime (24 hours)
pub const SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// The logged in user, as returned by the backend `login` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl UserSession {
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        UserSession {
            username: username.into(),
            role: role.into(),
            avatar: None,
        }
    }

    /// Protected pages need both a username and a role
    pub fn is_authenticated(&self) -> bool {
        !self.username.is_empty() && !self.role.is_empty()
    }
}

/// Session context handed to the view layer
///
/// Set on successful login, cleared on logout, read by every protected page.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<UserSession>;
    fn set(&self, session: UserSession);
    fn clear(&self);

    /// The current session, if it is complete enough to open protected pages
    fn authenticated(&self) -> Option<UserSession> {
        self.get().filter(UserSession::is_authenticated)
    }
}

/// Session held in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<UserSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<UserSession> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, session: UserSession) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Session persisted to a file, surviving process restarts
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<UserSession> {
        if !self.path.exists() {
            return None;
        }
        match saving::load_session(&self.path) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, session: UserSession) {
        if let Err(e) = saving::save_session(&session, &self.path) {
            warn!("Failed to write session file {}: {}", self.path.display(), e);
        }
    }

    fn clear(&self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Failed to remove session file {}: {}", self.path.display(), e);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    session: UserSession,
    expires_at: SystemTime,
}

/// Server side sessions, keyed by the id stored in the `session` cookie
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        SessionRegistry::new(SESSION_DURATION)
    }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a new session
    ///
    /// # Arguments
    /// * `session` - The user that just logged in
    ///
    /// # Returns
    /// * `String` - A unique session ID for the cookie
    pub fn create(&self, session: UserSession) -> String {
        let session_id = Uuid::new_v4().to_string();
        let entry = Entry {
            session,
            expires_at: SystemTime::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session_id.clone(), entry);

        session_id
    }

    /// The user behind `session_id`, unless the session is unknown or expired
    pub fn validate(&self, session_id: &str) -> Option<UserSession> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);

        sessions
            .get(session_id)
            .filter(|entry| entry.expires_at > SystemTime::now())
            .map(|entry| entry.session.clone())
    }

    /// Replace the user of an existing session, keeping its expiry
    pub fn update(&self, session_id: &str, session: UserSession) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(session_id) {
            Some(entry) => {
                entry.session = session;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, session_id: &str) -> Option<UserSession> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session_id).map(|entry| entry.session)
    }

    /// Drop expired sessions, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One registry entry seen through the [`SessionStore`] interface
#[derive(Debug, Clone)]
pub struct SessionHandle {
    registry: Arc<SessionRegistry>,
    session_id: String,
}

impl SessionHandle {
    pub fn new(registry: Arc<SessionRegistry>, session_id: impl Into<String>) -> Self {
        SessionHandle {
            registry,
            session_id: session_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }
}

impl SessionStore for SessionHandle {
    fn get(&self) -> Option<UserSession> {
        self.registry.validate(&self.session_id)
    }

    fn set(&self, session: UserSession) {
        if !self.registry.update(&self.session_id, session.clone()) {
            let mut sessions = self.registry.sessions.write().unwrap_or_else(PoisonError::into_inner);
            sessions.insert(
                self.session_id.clone(),
                Entry {
                    session,
                    expires_at: SystemTime::now() + self.registry.ttl,
                },
            );
        }
    }

    fn clear(&self) {
        self.registry.remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_clear() {
        let store = MemorySessionStore::new();
        assert!(store.get().is_none());

        store.set(UserSession::new("alice", "Admin"));
        assert_eq!(store.get().unwrap().username, "alice");
        assert!(store.authenticated().is_some());

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn missing_role_is_not_authenticated() {
        let store = MemorySessionStore::new();
        store.set(UserSession::new("alice", ""));
        assert!(store.get().is_some());
        assert!(store.authenticated().is_none());
    }

    #[test]
    fn file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.bin.gz");

        let store = FileSessionStore::new(&path);
        assert!(store.get().is_none());
        store.set(UserSession::new("bob", "Viewer"));

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.get(), Some(UserSession::new("bob", "Viewer")));

        reopened.clear();
        assert!(!path.exists());
        assert!(store.get().is_none());
    }

    #[test]
    fn registry_validates_and_expires() {
        let registry = SessionRegistry::default();
        let id = registry.create(UserSession::new("alice", "Admin"));
        assert_eq!(registry.validate(&id).unwrap().username, "alice");
        assert!(registry.validate("nope").is_none());

        let expired = SessionRegistry::new(Duration::ZERO);
        let old = expired.create(UserSession::new("alice", "Admin"));
        assert!(expired.validate(&old).is_none());
        assert_eq!(expired.purge_expired(), 1);
        assert!(expired.is_empty());
    }

    #[test]
    fn handle_exposes_one_entry() {
        let registry = Arc::new(SessionRegistry::default());
        let id = registry.create(UserSession::new("alice", "Admin"));
        let handle = SessionHandle::new(registry.clone(), id.clone());

        assert_eq!(handle.get().unwrap().role, "Admin");
        handle.set(UserSession::new("alice", "Approver"));
        assert_eq!(registry.validate(&id).unwrap().role, "Approver");

        handle.clear();
        assert!(registry.validate(&id).is_none());
        assert_eq!(registry.len(), 0);
    }
}
