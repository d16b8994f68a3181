// Parley — Session
//
// Holds the token and user profile for the signed-in user, mirrored to a
// persistence port on every mutation (the localStorage analog). The port is
// injected so tests can swap the JSON file for an in-memory fake.
//
// Logout contract: the backend signout call is best-effort — local state is
// cleared unconditionally, even when the network call fails.

use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::atoms::error::{ClientError, ClientResult};
use crate::atoms::types::UserProfile;
use crate::client::ApiClient;

// ── Persistence port ───────────────────────────────────────────────────

/// What survives a restart: the token and the last-fetched profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

pub trait SessionStorage {
    fn load(&self) -> ClientResult<Option<PersistedSession>>;
    fn save(&self, session: &PersistedSession) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

/// JSON file under the platform data dir.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    path: PathBuf,
}

impl DiskStorage {
    /// Storage at the default location (`<data dir>/parley/session.json`).
    pub fn new() -> ClientResult<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| ClientError::Config("no platform data directory".into()))?
            .join("parley");
        Ok(DiskStorage {
            path: dir.join("session.json"),
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        DiskStorage { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionStorage for DiskStorage {
    fn load(&self) -> ClientResult<Option<PersistedSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // A corrupt session file means signing in again, not a crash.
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("[session] discarding unreadable session file: {}", e);
                Ok(None)
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory fake for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: parking_lot::Mutex<Option<PersistedSession>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> ClientResult<Option<PersistedSession>> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, session: &PersistedSession) -> ClientResult<()> {
        *self.inner.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.inner.lock() = None;
        Ok(())
    }
}

// ── Session holder ─────────────────────────────────────────────────────

pub struct Session<S: SessionStorage> {
    storage: S,
    token: Option<String>,
    user: Option<UserProfile>,
}

impl<S: SessionStorage> Session<S> {
    /// Hydrate from storage at startup. An unreadable store starts a
    /// signed-out session.
    pub fn hydrate(storage: S) -> Self {
        let persisted = storage.load().unwrap_or_else(|e| {
            warn!("[session] failed to load persisted session: {}", e);
            None
        });
        let (token, user) = match persisted {
            Some(p) => (Some(p.token), p.user),
            None => (None, None),
        };
        Session {
            storage,
            token,
            user,
        }
    }

    pub fn authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Store a fresh token (login/signup) and persist immediately.
    pub fn login(&mut self, token: String) -> ClientResult<()> {
        self.token = Some(token);
        self.persist()
    }

    /// Replace the cached profile (after `GET /user`) and persist.
    pub fn set_user(&mut self, user: UserProfile) -> ClientResult<()> {
        self.user = Some(user);
        self.persist()
    }

    /// Notify the backend, then clear local state. The clear happens even
    /// when the signout call fails.
    pub async fn logout(&mut self, api: &ApiClient) -> ClientResult<()> {
        if let Some(token) = self.token.take() {
            if let Err(e) = api.signout(&token).await {
                warn!("[session] signout notification failed: {}", e);
            }
        }
        self.user = None;
        self.storage.clear()?;
        debug!("[session] local session cleared");
        Ok(())
    }

    fn persist(&self) -> ClientResult<()> {
        match &self.token {
            Some(token) => self.storage.save(&PersistedSession {
                token: token.clone(),
                user: self.user.clone(),
            }),
            None => self.storage.clear(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            username: "ada".into(),
            email: "ada@example.com".into(),
            age: 29,
            profession: "engineer".into(),
            phone: "5551234".into(),
            description: None,
            profile_picture: None,
        }
    }

    #[test]
    fn hydrate_from_empty_storage_is_signed_out() {
        let session = Session::hydrate(MemoryStorage::new());
        assert!(!session.authenticated());
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn login_and_set_user_persist_synchronously() {
        let storage = MemoryStorage::new();
        let mut session = Session::hydrate(storage);
        session.login("tok-1".into()).unwrap();
        session.set_user(profile()).unwrap();

        let persisted = session.storage.load().unwrap().unwrap();
        assert_eq!(persisted.token, "tok-1");
        assert_eq!(persisted.user.unwrap().username, "ada");
    }

    #[tokio::test]
    async fn logout_clears_storage_even_when_signout_fails() {
        let storage = MemoryStorage::new();
        storage
            .save(&PersistedSession {
                token: "tok-1".into(),
                user: Some(profile()),
            })
            .unwrap();

        let mut session = Session::hydrate(storage);
        assert!(session.authenticated());

        // Nothing listens here — the signout call is rejected.
        let api = ApiClient::new("http://127.0.0.1:9");
        session.logout(&api).await.unwrap();

        assert!(!session.authenticated());
        assert!(session.user().is_none());
        assert!(session.storage.load().unwrap().is_none());
    }

    #[test]
    fn disk_storage_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::with_path(dir.path().join("session.json"));

        assert!(storage.load().unwrap().is_none());

        storage
            .save(&PersistedSession {
                token: "tok-2".into(),
                user: None,
            })
            .unwrap();
        assert_eq!(storage.load().unwrap().unwrap().token, "tok-2");

        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
        // Clearing twice is fine.
        storage.clear().unwrap();
    }

    #[test]
    fn disk_storage_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = DiskStorage::with_path(path);
        assert!(storage.load().unwrap().is_none());
    }
}
