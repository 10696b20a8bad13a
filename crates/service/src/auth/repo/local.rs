use std::sync::Arc;

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use async_trait::async_trait;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::domain::ProviderUser;
use crate::auth::errors::AuthError;
use crate::auth::provider::{validate_credentials, IdentityProvider};
use crate::errors::ServiceError;
use crate::storage::{keys, JsonMapStore, LocalStorage};

/// Stored account: provider profile plus hashed password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredAccount {
    pub user: ProviderUser,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Identity provider backed by local storage, keyed by lowercased email.
///
/// Passwords are hashed with Argon2. The current user lives in memory only;
/// the auth store persists the session.
pub struct LocalIdentityProvider {
    accounts: Arc<JsonMapStore<String, StoredAccount>>,
    current: RwLock<Option<ProviderUser>>,
}

fn repo_err(e: ServiceError) -> AuthError {
    AuthError::Repository(e.to_string())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl LocalIdentityProvider {
    pub async fn open(storage: LocalStorage) -> Result<Self, AuthError> {
        let accounts = JsonMapStore::open(storage, keys::IDENTITY_ACCOUNTS).await.map_err(repo_err)?;
        Ok(Self { accounts, current: RwLock::new(None) })
    }

    /// Number of registered identities.
    pub async fn account_count(&self) -> usize {
        self.accounts.len().await
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
        validate_credentials(email, password)?;
        let key = normalize_email(email);

        // hash outside the store lock; the existence check and insert below are one mutation
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = ProviderUser { uid: Uuid::new_v4().to_string(), email: email.trim().to_string(), display_name: None, photo_url: None };
        let account = StoredAccount { user: user.clone(), password_hash: hash, password_algorithm: "argon2".into() };
        let inserted = self
            .accounts
            .update_map(|map| {
                if map.contains_key(&key) {
                    return Ok(false);
                }
                map.insert(key.clone(), account);
                Ok(true)
            })
            .await
            .map_err(repo_err)?;
        if !inserted {
            debug!(email = %key, "account exists");
            return Err(AuthError::Conflict);
        }

        *self.current.write().await = Some(user.clone());
        info!(uid = %user.uid, email = %user.email, "account created");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
        let account = self.accounts.get(&normalize_email(email)).await.ok_or(AuthError::Unauthorized)?;
        let parsed = PasswordHash::new(&account.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }
        *self.current.write().await = Some(account.user.clone());
        Ok(account.user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current.write().await = None;
        Ok(())
    }

    async fn update_profile(&self, uid: &str, display_name: Option<&str>, photo_url: Option<&str>) -> Result<ProviderUser, AuthError> {
        let updated = self
            .accounts
            .update_map(|map| {
                let account = map
                    .values_mut()
                    .find(|a| a.user.uid == uid)
                    .ok_or_else(|| ServiceError::not_found("account"))?;
                if let Some(name) = display_name { account.user.display_name = Some(name.to_string()); }
                if let Some(photo) = photo_url { account.user.photo_url = Some(photo.to_string()); }
                Ok(account.user.clone())
            })
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => AuthError::NotFound,
                other => repo_err(other),
            })?;
        let mut current = self.current.write().await;
        if current.as_ref().is_some_and(|c| c.uid == uid) {
            *current = Some(updated.clone());
        }
        Ok(updated)
    }

    async fn current_user(&self) -> Option<ProviderUser> {
        self.current.read().await.clone()
    }
}
