use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::api::types::UserProfile;
use crate::utils::storage::{keys, MemoryStorage, Storage, StorageError};

/// Process-wide auth session: the current token pair and the cached user
/// profile. Constructed explicitly and injected wherever it is needed, so
/// tests can build isolated instances instead of sharing a global.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state: RwLock<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserProfile>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        SessionStore {
            storage,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Store backed by volatile memory. Anything persisted dies with the
    /// process; intended for tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Load persisted credentials and profile at launch. A corrupt profile
    /// entry is dropped rather than failing hydration.
    pub fn hydrate(&self) -> Result<(), StorageError> {
        let access_token = self.storage.get_item(keys::ACCESS_TOKEN)?;
        let refresh_token = self.storage.get_item(keys::REFRESH_TOKEN)?;
        let user = match self.storage.get_item(keys::CURRENT_USER)? {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!(%err, "discarding unreadable cached profile");
                    None
                }
            },
            None => None,
        };

        let mut state = self.write();
        state.access_token = access_token;
        state.refresh_token = refresh_token;
        state.user = user;
        Ok(())
    }

    /// Install a new token pair, replacing whatever was current.
    pub fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), StorageError> {
        self.storage.set_item(keys::ACCESS_TOKEN, access)?;
        self.storage.set_item(keys::REFRESH_TOKEN, refresh)?;
        let mut state = self.write();
        state.access_token = Some(access.to_string());
        state.refresh_token = Some(refresh.to_string());
        Ok(())
    }

    pub fn set_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        self.storage
            .set_item(keys::CURRENT_USER, &serde_json::to_string(user)?)?;
        self.write().user = Some(user.clone());
        Ok(())
    }

    /// Drop credentials and profile, in memory and on disk. Used at logout
    /// and after a failed token refresh.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(keys::ACCESS_TOKEN)?;
        self.storage.remove_item(keys::REFRESH_TOKEN)?;
        self.storage.remove_item(keys::CURRENT_USER)?;
        let mut state = self.write();
        *state = SessionState::default();
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access_token.is_some()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
