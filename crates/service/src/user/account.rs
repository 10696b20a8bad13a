use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::domain::{ProviderUser, Role};
use crate::errors::ServiceError;
use crate::storage::{keys, LocalStorage};

/// Per-account profile data, stored under `userData_<uid>`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub email_notifications: bool,
    pub app_notifications: bool,
}

impl AccountData {
    fn defaults_for(user: &ProviderUser, role: Role) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone().unwrap_or_default(),
            role,
            phone_number: None,
            photo_url: user.photo_url.clone(),
            email_notifications: true,
            app_notifications: true,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub phone_number: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub email_notifications: Option<bool>,
    pub app_notifications: Option<bool>,
}

impl AccountPatch {
    fn apply(self, data: &mut AccountData) {
        if let Some(v) = self.display_name { data.display_name = v; }
        if let Some(v) = self.role { data.role = v; }
        if let Some(v) = self.phone_number { data.phone_number = Some(v); }
        if let Some(v) = self.photo_url { data.photo_url = Some(v); }
        if let Some(v) = self.email_notifications { data.email_notifications = v; }
        if let Some(v) = self.app_notifications { data.app_notifications = v; }
    }
}

/// Reads and writes the `userData_<uid>` blobs, one key per account.
#[derive(Clone)]
pub struct AccountDataStore {
    storage: LocalStorage,
}

impl AccountDataStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<AccountData>, ServiceError> {
        Ok(self.storage.get_json(&keys::user_data(uid)).await?)
    }

    /// Stored data for the account, or freshly written defaults.
    pub async fn load_or_init(&self, user: &ProviderUser, role: Role) -> Result<AccountData, ServiceError> {
        if let Some(existing) = self.get(&user.uid).await? {
            return Ok(existing);
        }
        let data = AccountData::defaults_for(user, role);
        self.save(&data).await?;
        debug!(uid = %data.uid, role = %data.role, "account data initialized");
        Ok(data)
    }

    /// Overwrite the blob for `data.uid`.
    pub async fn save(&self, data: &AccountData) -> Result<(), ServiceError> {
        self.storage.set_json(&keys::user_data(&data.uid), data).await?;
        Ok(())
    }

    /// Shallow-merge into the stored data; `NotFound` if the account has none.
    pub async fn update(&self, uid: &str, patch: AccountPatch) -> Result<AccountData, ServiceError> {
        let mut data = self.get(uid).await?.ok_or_else(|| ServiceError::not_found("account data"))?;
        patch.apply(&mut data);
        self.save(&data).await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_user(uid: &str) -> ProviderUser {
        ProviderUser { uid: uid.into(), email: format!("{uid}@example.com"), display_name: Some("Ann".into()), photo_url: None }
    }

    #[tokio::test]
    async fn load_or_init_writes_defaults_once() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("account_data_{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(&dir).await?;
        let store = AccountDataStore::new(storage.clone());

        let data = store.load_or_init(&provider_user("u1"), Role::Reader).await?;
        assert_eq!(data.display_name, "Ann");
        assert_eq!(data.role, Role::Reader);
        assert!(data.email_notifications && data.app_notifications);
        assert!(storage.get_item("userData_u1").await?.is_some());

        // later calls keep what is stored, even if the role passed differs
        store.update("u1", AccountPatch { role: Some(Role::Writer), phone_number: Some("555".into()), ..Default::default() }).await?;
        let again = store.load_or_init(&provider_user("u1"), Role::Reader).await?;
        assert_eq!(again.role, Role::Writer);
        assert_eq!(again.phone_number.as_deref(), Some("555"));

        let raw: serde_json::Value = storage.get_json("userData_u1").await?.unwrap();
        assert_eq!(raw["displayName"], "Ann");
        assert_eq!(raw["role"], "writer");

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn update_without_data_is_not_found() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("account_data_{}", uuid::Uuid::new_v4()));
        let store = AccountDataStore::new(LocalStorage::new(&dir).await?);
        let res = store.update("ghost", AccountPatch::default()).await;
        assert!(matches!(res, Err(ServiceError::NotFound(_))));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
