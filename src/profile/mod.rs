//! Profile editing: identity fields, contact details, avatar and account removal

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::data::{
    BlobError, BlobStore, Profile, ProfilePatch, ProfileRepository, RepositoryError,
};
use crate::identity::{AuthError, Identity, SessionStore};

/// Blob directory holding one avatar per identity
pub const AVATAR_DIR: &str = "profile_images";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("The selected avatar image is empty")]
    EmptyAvatar,
}

impl ProfileError {
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, ProfileError::Auth(AuthError::ReauthenticationRequired))
    }
}

/// Values submitted from the profile form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub display_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ProfileForm {
    /// Prefill from the current identity and stored profile
    pub fn from_current(identity: &Identity, profile: &Profile) -> Self {
        Self {
            display_name: identity.display_name.clone().unwrap_or_default(),
            email: identity.email.clone().unwrap_or_default(),
            phone: profile.phone.clone(),
            address: profile.address.clone(),
        }
    }
}

#[derive(Debug)]
pub enum FieldOutcome {
    Unchanged,
    Updated,
    Failed(ProfileError),
}

impl FieldOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FieldOutcome::Failed(_))
    }

    fn from_result<T, E: Into<ProfileError>>(result: Result<T, E>) -> Self {
        match result {
            Ok(_) => FieldOutcome::Updated,
            Err(e) => FieldOutcome::Failed(e.into()),
        }
    }
}

/// Per-field result of a profile save. Successful fields are not rolled
/// back when another field fails.
#[derive(Debug)]
pub struct ProfileUpdateReport {
    pub display_name: FieldOutcome,
    pub email: FieldOutcome,
    /// Phone and address, written together
    pub contact: FieldOutcome,
}

impl ProfileUpdateReport {
    pub fn is_success(&self) -> bool {
        !self.display_name.is_failed() && !self.email.is_failed() && !self.contact.is_failed()
    }

    pub fn failures(&self) -> Vec<(&'static str, &ProfileError)> {
        [
            ("display_name", &self.display_name),
            ("email", &self.email),
            ("contact", &self.contact),
        ]
        .into_iter()
        .filter_map(|(field, outcome)| match outcome {
            FieldOutcome::Failed(e) => Some((field, e)),
            _ => None,
        })
        .collect()
    }

    pub fn requires_reauthentication(&self) -> bool {
        self.failures()
            .iter()
            .any(|(_, e)| e.requires_reauthentication())
    }
}

/// Explicit user confirmation for destructive account actions
#[derive(Debug, Clone, Copy)]
pub struct Confirmation(());

impl Confirmation {
    pub fn confirmed() -> Self {
        Confirmation(())
    }
}

#[derive(Clone)]
pub struct ProfileService {
    session: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileRepository>,
    blobs: Arc<dyn BlobStore>,
    cached: Arc<RwLock<Option<Profile>>>,
}

impl ProfileService {
    pub fn new(
        session: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            session,
            profiles,
            blobs,
            cached: Arc::new(RwLock::new(None)),
        }
    }

    /// Read the profile document; an identity without one gets the default
    pub async fn load_profile(&self, identity: &Identity) -> Result<Profile, ProfileError> {
        let profile = self
            .profiles
            .get(&identity.id)
            .await?
            .unwrap_or_else(|| Profile::empty(identity.id.clone()));
        *self.cached.write() = Some(profile.clone());
        Ok(profile)
    }

    pub fn cached_profile(&self) -> Option<Profile> {
        self.cached.read().clone()
    }

    pub fn show_process_flow(&self) -> bool {
        self.cached
            .read()
            .as_ref()
            .map(|profile| profile.show_process_flow)
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        *self.cached.write() = None;
    }

    /// Save the profile form.
    ///
    /// Display name and email go to the session store only when changed
    /// (email only when non-empty). Phone and address are always written
    /// with a fresh `updated_at`.
    pub async fn update_profile(&self, identity: &Identity, form: &ProfileForm) -> ProfileUpdateReport {
        let display_name = if identity.display_name.as_deref().unwrap_or_default() == form.display_name {
            FieldOutcome::Unchanged
        } else {
            FieldOutcome::from_result(self.session.update_display_name(&form.display_name).await)
        };

        let email = form.email.trim();
        let email = if email.is_empty() || identity.email.as_deref() == Some(email) {
            FieldOutcome::Unchanged
        } else {
            FieldOutcome::from_result(self.session.update_email(email).await)
        };

        let patch = ProfilePatch::contact(form.phone.as_str(), form.address.as_str());
        let contact = match self.profiles.merge_write(&identity.id, &patch).await {
            Ok(profile) => {
                *self.cached.write() = Some(profile);
                FieldOutcome::Updated
            }
            Err(e) => FieldOutcome::Failed(e.into()),
        };

        let report = ProfileUpdateReport {
            display_name,
            email,
            contact,
        };
        for (field, e) in report.failures() {
            tracing::warn!(user = %identity.id, field, error = %e, "Profile field update failed");
        }
        report
    }

    /// Upload a new avatar and point the identity at it. On failure the
    /// previous avatar URL stays in place.
    pub async fn update_avatar(&self, identity: &Identity, bytes: &[u8]) -> Result<Identity, ProfileError> {
        if bytes.is_empty() {
            return Err(ProfileError::EmptyAvatar);
        }
        let path = avatar_path(identity);
        let blob = self.blobs.put(&path, bytes).await?;
        let url = self.blobs.download_url(&blob).await?;
        let updated = self.session.update_avatar_url(&url).await?;
        tracing::info!(user = %identity.id, "Avatar updated");
        Ok(updated)
    }

    /// Delete the identity. A stale login surfaces as reauthentication
    /// required; there is no retry.
    pub async fn delete_account(
        &self,
        identity: &Identity,
        _confirmation: Confirmation,
    ) -> Result<(), ProfileError> {
        self.session.delete_current_identity().await?;
        self.clear();
        tracing::info!(user = %identity.id, "Account deleted");
        Ok(())
    }

    /// Flip the process-flow preference optimistically; the cached value is
    /// reverted if the write fails. Returns the new value.
    pub async fn toggle_process_flow(&self, identity: &Identity) -> Result<bool, ProfileError> {
        let previous = {
            let mut cached = self.cached.write();
            let profile = cached.get_or_insert_with(|| Profile::empty(identity.id.clone()));
            let previous = profile.show_process_flow;
            profile.show_process_flow = !previous;
            previous
        };

        let next = !previous;
        if let Err(e) = self
            .profiles
            .merge_write(&identity.id, &ProfilePatch::process_flow(next))
            .await
        {
            tracing::warn!(user = %identity.id, error = %e, "Failed to save process flow preference");
            if let Some(profile) = self.cached.write().as_mut() {
                profile.show_process_flow = previous;
            }
            return Err(e.into());
        }
        Ok(next)
    }
}

fn avatar_path(identity: &Identity) -> String {
    format!("{}/{}", AVATAR_DIR, identity.id)
}
