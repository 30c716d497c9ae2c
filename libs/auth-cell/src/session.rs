use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use shared_gateway::TokenSource;
use shared_models::auth::{AuthResponse, Role, UserProfile};
use shared_models::error::AppError;
use shared_utils::jwt::token_usable;
use shared_utils::storage::{get_json, keys, set_json, KeyValueStore};

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// The single session of this portal process.
///
/// Persisted storage is the source of truth: every read goes to the store, so
/// a session written by an earlier run is visible after `hydrate`. Observers
/// subscribe to the current user and see `None` after logout or revocation.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    changes: watch::Sender<Option<UserProfile>>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (changes, _) = watch::channel(None);
        Self { store, changes }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Loads the persisted session on start-up. An expired token or an
    /// unreadable profile discards the whole session.
    pub fn hydrate(&self) -> Option<UserProfile> {
        let token = self.store.get(keys::JWT_TOKEN);
        let user = get_json::<UserProfile>(self.store.as_ref(), keys::CURRENT_USER);

        match (token, user) {
            (Some(token), Some(user)) if token_usable(&token) => {
                info!("Restored session for {} ({})", user.email, user.role);
                self.changes.send_replace(Some(user.clone()));
                Some(user)
            }
            (None, None) => None,
            _ => {
                warn!("Persisted session is expired or incomplete, discarding");
                self.clear();
                None
            }
        }
    }

    /// Persists a fresh session from a login or registration response.
    pub fn establish(&self, res: AuthResponse) -> Result<Session, AppError> {
        let token = res
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::Auth("Login response carried no token".to_string()))?;
        let user = UserProfile::from(res);

        self.persist(&token, &user)?;
        info!("Session established for {} ({})", user.email, user.role);
        self.changes.send_replace(Some(user.clone()));

        Ok(Session { token, user })
    }

    /// Replaces the cached profile wholesale after a profile update, keeping
    /// the current token unless the API issued a new one.
    pub fn refresh(&self, res: AuthResponse) -> Result<UserProfile, AppError> {
        let token = res
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.token())
            .ok_or_else(|| AppError::Auth("No active session".to_string()))?;
        let mut user = UserProfile::from(res);
        if let Some(current) = self.user() {
            user.id = user.id.or(current.id);
            user.profile_id = user.profile_id.or(current.profile_id);
            user.hospital_id = user.hospital_id.or(current.hospital_id);
        }

        self.persist(&token, &user)?;
        self.changes.send_replace(Some(user.clone()));
        Ok(user)
    }

    fn persist(&self, token: &str, user: &UserProfile) -> Result<(), AppError> {
        self.store
            .set(keys::JWT_TOKEN, token)
            .and_then(|_| set_json(self.store.as_ref(), keys::CURRENT_USER, user))
            .map_err(|e| AppError::Internal(format!("Could not persist session: {}", e)))
    }

    /// Unconditionally removes the persisted session and notifies observers.
    pub fn clear(&self) {
        for key in [keys::JWT_TOKEN, keys::CURRENT_USER] {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove {} from storage: {}", key, e);
            }
        }
        info!("Session cleared");
        self.changes.send_replace(None);
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(keys::JWT_TOKEN).filter(|t| !t.is_empty())
    }

    pub fn user(&self) -> Option<UserProfile> {
        get_json(self.store.as_ref(), keys::CURRENT_USER)
    }

    pub fn current(&self) -> Option<Session> {
        Some(Session {
            token: self.token()?,
            user: self.user()?,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|s| s.user.role)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    /// Merges `patch` into the persisted profile without a round trip. A
    /// no-op when nobody is logged in.
    pub fn update_local_user(&self, patch: Value) -> Result<Option<UserProfile>, AppError> {
        let Some(current) = self.user() else {
            debug!("No user to update locally");
            return Ok(None);
        };

        let mut merged = serde_json::to_value(&current)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        if let (Value::Object(target), Value::Object(fields)) = (&mut merged, patch) {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }

        let updated: UserProfile = serde_json::from_value(merged)
            .map_err(|e| AppError::BadRequest(format!("Invalid profile fields: {}", e)))?;
        set_json(self.store.as_ref(), keys::CURRENT_USER, &updated)
            .map_err(|e| AppError::Internal(format!("Could not persist profile: {}", e)))?;
        self.changes.send_replace(Some(updated.clone()));

        Ok(Some(updated))
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.changes.subscribe()
    }
}

impl TokenSource for SessionStore {
    fn token(&self) -> Option<String> {
        SessionStore::token(self)
    }

    fn revoke(&self) {
        if self.is_logged_in() {
            self.clear();
        }
    }
}
