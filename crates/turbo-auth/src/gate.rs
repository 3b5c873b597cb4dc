//! Read-only view of the stored credentials, plus the writes that the
//! sign-in flow performs.

use std::sync::Arc;

use tracing::{debug, info, warn};
use turbo_cache::Storage;

use crate::identity::{user_id_of, Identity, UserRecord, TOKEN_KEY, USER_ID_KEY, USER_KEY};
use crate::AuthError;

/// Answers "who is signed in" from durable storage.
///
/// Nothing is cached: every call reads storage, so a sign-out by another
/// component is visible immediately.
#[derive(Clone)]
pub struct AuthGate {
    storage: Arc<dyn Storage>,
}

impl AuthGate {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "credential read failed");
                None
            }
        }
    }

    /// The stored token and user record.
    pub fn current_identity(&self) -> Identity {
        let token = self.read(TOKEN_KEY);
        let user = self.read(USER_KEY);
        Identity::from_stored(token, user.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_identity().is_authenticated()
    }

    /// Bearer token, if one is stored.
    pub fn token(&self) -> Option<String> {
        self.current_identity().token
    }

    /// The `userId` key, falling back to the user record's `id`.
    pub fn user_id(&self) -> Option<String> {
        self.read(USER_ID_KEY)
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.current_identity().record_user_id())
    }

    /// Store credentials obtained from the sign-in flow.
    pub fn sign_in(&self, token: &str, user: UserRecord) -> Result<Identity, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        if user.is_empty() {
            return Err(AuthError::InvalidUser("user record is empty".to_string()));
        }

        let encoded = serde_json::to_string(&user)?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &encoded)?;
        match user_id_of(&user) {
            Some(id) => self.storage.set(USER_ID_KEY, &id)?,
            None => self.storage.delete(USER_ID_KEY)?,
        }

        info!(user_id = ?user_id_of(&user), "signed in");
        Ok(Identity {
            token: Some(token.to_string()),
            user: Some(user),
        })
    }

    /// Remove every stored credential.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        for key in [TOKEN_KEY, USER_KEY, USER_ID_KEY] {
            self.storage.delete(key)?;
        }
        debug!("signed out");
        Ok(())
    }
}
