//! In-process session store
//!
//! Backs the headless binary and the test suite. Identity changes are
//! broadcast through a watch channel; sensitive mutations are rejected once
//! the login has been marked stale.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::store::{AuthError, Identity, SessionStore};

#[derive(Debug)]
struct LoginState {
    recent: bool,
    fail_profile_updates: bool,
}

pub struct LocalSessionStore {
    identity: watch::Sender<Option<Identity>>,
    login: Mutex<LoginState>,
}

impl LocalSessionStore {
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            identity,
            login: Mutex::new(LoginState {
                recent: false,
                fail_profile_updates: false,
            }),
        }
    }

    /// Create a store with `identity` already signed in
    pub fn signed_in(identity: Identity) -> Self {
        let store = Self::new();
        store.sign_in(identity);
        store
    }

    /// Sign in, replacing any current identity. A fresh sign-in counts as a recent login.
    pub fn sign_in(&self, identity: Identity) {
        self.login.lock().recent = true;
        tracing::debug!(user = %identity.id, "Identity signed in");
        self.identity.send_replace(Some(identity));
    }

    /// Mark the login as stale so sensitive changes require reauthentication
    pub fn expire_login(&self) {
        self.login.lock().recent = false;
    }

    /// Make display-name and avatar updates fail with a backend error
    pub fn fail_profile_updates(&self, fail: bool) {
        self.login.lock().fail_profile_updates = fail;
    }

    fn require_identity(&self) -> Result<Identity, AuthError> {
        self.identity.borrow().clone().ok_or(AuthError::NotSignedIn)
    }

    fn require_recent_login(&self) -> Result<(), AuthError> {
        if self.login.lock().recent {
            Ok(())
        } else {
            Err(AuthError::ReauthenticationRequired)
        }
    }

    fn check_profile_updates(&self) -> Result<(), AuthError> {
        if self.login.lock().fail_profile_updates {
            Err(AuthError::Backend("profile update rejected".to_string()))
        } else {
            Ok(())
        }
    }

    fn publish(&self, identity: Identity) -> Identity {
        self.identity.send_replace(Some(identity.clone()));
        identity
    }
}

impl Default for LocalSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    fn current(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.login.lock().recent = false;
        self.identity.send_replace(None);
        Ok(())
    }

    async fn update_display_name(&self, name: &str) -> Result<Identity, AuthError> {
        let mut identity = self.require_identity()?;
        self.check_profile_updates()?;
        identity.display_name = Some(name.to_string());
        Ok(self.publish(identity))
    }

    async fn update_email(&self, email: &str) -> Result<Identity, AuthError> {
        let mut identity = self.require_identity()?;
        self.require_recent_login()?;
        identity.email = Some(email.to_string());
        Ok(self.publish(identity))
    }

    async fn update_avatar_url(&self, url: &str) -> Result<Identity, AuthError> {
        let mut identity = self.require_identity()?;
        self.check_profile_updates()?;
        identity.avatar_url = Some(url.to_string());
        Ok(self.publish(identity))
    }

    async fn delete_current_identity(&self) -> Result<(), AuthError> {
        self.require_identity()?;
        self.require_recent_login()?;
        self.identity.send_replace(None);
        Ok(())
    }
}
