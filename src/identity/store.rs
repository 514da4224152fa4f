use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// Opaque identifier assigned by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in user as tracked by the session store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl Identity {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            display_name: None,
            email: None,
            avatar_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The change touches sensitive account data and the login is too old
    #[error("A recent sign-in is required for this change")]
    ReauthenticationRequired,
    #[error("No identity is signed in")]
    NotSignedIn,
    #[error("Session store error: {0}")]
    Backend(String),
}

/// Identity provider contract.
///
/// `subscribe` is the only way to observe identity changes; every other
/// component receives the identity explicitly from whoever holds the
/// subscription.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Receiver that yields the current identity and every later change
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    /// Snapshot of the current identity
    fn current(&self) -> Option<Identity>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn update_display_name(&self, name: &str) -> Result<Identity, AuthError>;

    /// May fail with [`AuthError::ReauthenticationRequired`]
    async fn update_email(&self, email: &str) -> Result<Identity, AuthError>;

    async fn update_avatar_url(&self, url: &str) -> Result<Identity, AuthError>;

    /// May fail with [`AuthError::ReauthenticationRequired`]
    async fn delete_current_identity(&self) -> Result<(), AuthError>;
}
