//! Typed access to the session stored in a [`SessionStore`]

use log::{debug, warn};
use std::sync::Arc;

use crate::profile::{Session, UserProfile};
use crate::store::{SessionStore, USER_INFO_KEY, USER_TOKEN_KEY};
use crate::Result;

/// Repository over the session keys.
///
/// Clones share the same underlying store, so one repository can be handed
/// to the gate, the auth client and the SOS trigger.
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn SessionStore>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The stored bearer token. Empty strings read as no token.
    pub async fn token(&self) -> Result<Option<String>> {
        let token = self.store.get(USER_TOKEN_KEY).await?;
        Ok(token.filter(|t| !t.is_empty()))
    }

    /// Whether a session exists. Only the token decides this.
    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.token().await?.is_some())
    }

    /// The cached profile snapshot
    pub async fn profile(&self) -> Result<Option<UserProfile>> {
        match self.store.get(USER_INFO_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// The emergency contact from the cached profile.
    ///
    /// An unreadable profile is treated as having no contact.
    pub async fn emergency_contact(&self) -> Option<String> {
        match self.profile().await {
            Ok(profile) => profile
                .as_ref()
                .and_then(UserProfile::emergency_contact)
                .map(str::to_string),
            Err(err) => {
                warn!("Failed to load emergency contact: {}", err);
                None
            }
        }
    }

    /// Persist a freshly created session.
    ///
    /// Token and profile are written together; a failed write leaves neither.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let profile = serde_json::to_string(&session.profile)?;
        self.store
            .set_all(&[
                (USER_INFO_KEY, profile.as_str()),
                (USER_TOKEN_KEY, session.token.as_str()),
            ])
            .await?;
        debug!("Session saved for {}", session.profile.email);
        Ok(())
    }

    /// Remove both the token and the profile snapshot
    pub async fn clear(&self) -> Result<()> {
        self.store
            .remove_all(&[USER_TOKEN_KEY, USER_INFO_KEY])
            .await?;
        debug!("Session cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SessionRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRepository").finish_non_exhaustive()
    }
}
