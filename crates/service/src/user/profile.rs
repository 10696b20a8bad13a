use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ServiceError;
use crate::storage::{keys, LocalStorage, PersistedState};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub email_notifications: bool,
    pub app_notifications: bool,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: "1".into(),
            full_name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            phone_number: "+1 234-567-8900".into(),
            profile_image: None,
            email_notifications: true,
            app_notifications: true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub email_notifications: Option<bool>,
    pub app_notifications: Option<bool>,
}

/// Persisted shape of `user-storage`. `user` is `None` after deactivation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserState {
    pub user: Option<UserProfile>,
}

impl Default for UserState {
    fn default() -> Self {
        Self { user: Some(UserProfile::default()) }
    }
}

/// Single-record profile store. Every mutation is a no-op once the record
/// has been cleared by `deactivate_account`.
pub struct UserProfileStore {
    state: PersistedState<UserState>,
}

impl UserProfileStore {
    pub async fn open(storage: LocalStorage) -> Result<Arc<Self>, ServiceError> {
        let state = PersistedState::open(storage, keys::USER).await?;
        Ok(Arc::new(Self { state }))
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.read(|s| s.user.clone()).await
    }

    /// Shallow-merge the patch; returns the updated profile.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<Option<UserProfile>, ServiceError> {
        self.modify(|u| {
            if let Some(v) = patch.id { u.id = v; }
            if let Some(v) = patch.full_name { u.full_name = v; }
            if let Some(v) = patch.email { u.email = v; }
            if let Some(v) = patch.phone_number { u.phone_number = v; }
            if let Some(v) = patch.profile_image { u.profile_image = Some(v); }
            if let Some(v) = patch.email_notifications { u.email_notifications = v; }
            if let Some(v) = patch.app_notifications { u.app_notifications = v; }
        })
        .await
    }

    pub async fn set_profile_image(&self, image_url: impl Into<String>) -> Result<Option<UserProfile>, ServiceError> {
        let image_url = image_url.into();
        self.modify(|u| u.profile_image = Some(image_url)).await
    }

    /// Returns the new flag value.
    pub async fn toggle_email_notifications(&self) -> Result<Option<bool>, ServiceError> {
        let profile = self.modify(|u| u.email_notifications = !u.email_notifications).await?;
        Ok(profile.map(|u| u.email_notifications))
    }

    /// Returns the new flag value.
    pub async fn toggle_app_notifications(&self) -> Result<Option<bool>, ServiceError> {
        let profile = self.modify(|u| u.app_notifications = !u.app_notifications).await?;
        Ok(profile.map(|u| u.app_notifications))
    }

    /// Clear the record. It stays cleared (also across reopen) until `reset`.
    pub async fn deactivate_account(&self) -> Result<(), ServiceError> {
        self.state.update(|s| s.user = None).await?;
        info!("user profile deactivated");
        Ok(())
    }

    /// Restore the default record, as a fresh install would have it.
    pub async fn reset(&self) -> Result<UserProfile, ServiceError> {
        let fresh = UserProfile::default();
        self.state.replace(UserState { user: Some(fresh.clone()) }).await?;
        Ok(fresh)
    }

    async fn modify(&self, f: impl FnOnce(&mut UserProfile)) -> Result<Option<UserProfile>, ServiceError> {
        let updated = self
            .state
            .update(|s| {
                let user = s.user.as_mut()?;
                f(user);
                Some(user.clone())
            })
            .await?;
        Ok(updated)
    }
}
