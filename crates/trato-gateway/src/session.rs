//! Persisted session state: the bearer token and the signed-in user.
//!
//! The session lives in one file under the client's data directory and in
//! one place in memory. It is only ever written by [`SessionStore::establish`]
//! (after a successful login) and removed by [`SessionStore::clear`]
//! (logout, or a 401 from a protected endpoint). Everything else reads.
//!
//! A missing or malformed session file means signed out, never an error:
//! every consumer treats `None` as "ask the user to sign in again".

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use trato_core::{AuthSession, User, UserId};

/// Filename for the persisted session inside the data directory.
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionState {
    token: String,
    user: User,
}

/// The session resolver and its storage.
pub struct SessionStore {
    path: PathBuf,
    state: RwLock<Option<SessionState>>,
}

impl SessionStore {
    /// Loads the session from `data_dir`, tolerating a missing or
    /// malformed file. Malformed content is logged and treated as signed
    /// out; it gets overwritten by the next successful login.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SESSION_FILE);
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<SessionState>(&raw) {
                Ok(state) => {
                    debug!(user = %state.user.id, "restored session");
                    Some(state)
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "malformed session file, treating as signed out");
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    /// A store that never touches the disk. Used by tests and demo mode.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            state: RwLock::new(None),
        }
    }

    /// Persists a fresh login. This is the only way a session begins.
    pub fn establish(&self, session: AuthSession) {
        let state = SessionState {
            token: session.token,
            user: session.user,
        };
        info!(user = %state.user.id, "session established");
        self.persist(&state);
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = Some(state);
    }

    /// Drops the session and removes the file. Called on logout and on a
    /// 401 from any protected endpoint.
    pub fn clear(&self) {
        let previous = self
            .state
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if previous.is_some() {
            info!("session cleared");
        }
        if !self.path.as_os_str().is_empty() {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    /// The signed-in user's id, or `None` when signed out.
    pub fn current_user_id(&self) -> Option<UserId> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|state| state.user.id)
    }

    /// The signed-in user's profile snapshot.
    pub fn current_user(&self) -> Option<User> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|state| state.user.clone())
    }

    /// The bearer token attached to every protected request.
    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|state| state.token.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn persist(&self, state: &SessionState) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Some(dir) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(dir) {
                warn!(dir = %dir.display(), %err, "could not create session directory");
                return;
            }
        }
        match serde_json::to_string_pretty(state) {
            Ok(raw) => {
                if let Err(err) = std::fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), %err, "could not persist session");
                }
            }
            Err(err) => warn!(%err, "could not serialize session"),
        }
    }
}
