use async_trait::async_trait;

use super::domain::ProviderUser;
use super::errors::AuthError;

/// Minimum password length accepted by the provider.
pub const MIN_PASSWORD_LEN: usize = 6;

/// External identity provider boundary.
///
/// The rest of the crate only relies on it returning a uid and an email;
/// `create_user` and `sign_in` also make that user the provider's current user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_user(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    /// Set display name and/or photo; `None` leaves a field unchanged.
    async fn update_profile(&self, uid: &str, display_name: Option<&str>, photo_url: Option<&str>) -> Result<ProviderUser, AuthError>;
    async fn current_user(&self) -> Option<ProviderUser>;
}

/// Credential shape checks shared by provider implementations.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::Validation("invalid email".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

/// Simple in-memory mock provider for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockIdentityProvider {
        users: Mutex<HashMap<String, (String, ProviderUser)>>, // key: email -> (password, user)
        current: Mutex<Option<ProviderUser>>,
        fail_next: Mutex<Option<String>>,
    }

    impl MockIdentityProvider {
        /// Make the next provider call fail with this message.
        pub fn fail_next(&self, message: &str) {
            *self.fail_next.lock().unwrap() = Some(message.to_string());
        }

        fn injected_failure(&self) -> Result<(), AuthError> {
            match self.fail_next.lock().unwrap().take() {
                Some(msg) => Err(AuthError::Provider(msg)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentityProvider {
        async fn create_user(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
            self.injected_failure()?;
            validate_credentials(email, password)?;
            let mut users = self.users.lock().unwrap();
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            let user = ProviderUser { uid: uuid::Uuid::new_v4().to_string(), email: email.to_string(), display_name: None, photo_url: None };
            users.insert(email.to_string(), (password.to_string(), user.clone()));
            *self.current.lock().unwrap() = Some(user.clone());
            Ok(user)
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, AuthError> {
            self.injected_failure()?;
            let users = self.users.lock().unwrap();
            match users.get(email) {
                Some((pw, user)) if pw == password => {
                    *self.current.lock().unwrap() = Some(user.clone());
                    Ok(user.clone())
                }
                _ => Err(AuthError::Unauthorized),
            }
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            self.injected_failure()?;
            *self.current.lock().unwrap() = None;
            Ok(())
        }

        async fn update_profile(&self, uid: &str, display_name: Option<&str>, photo_url: Option<&str>) -> Result<ProviderUser, AuthError> {
            self.injected_failure()?;
            let mut users = self.users.lock().unwrap();
            let (_, user) = users.values_mut().find(|(_, u)| u.uid == uid).ok_or(AuthError::NotFound)?;
            if let Some(name) = display_name { user.display_name = Some(name.to_string()); }
            if let Some(photo) = photo_url { user.photo_url = Some(photo.to_string()); }
            let updated = user.clone();
            let mut current = self.current.lock().unwrap();
            if current.as_ref().is_some_and(|c| c.uid == uid) {
                *current = Some(updated.clone());
            }
            Ok(updated)
        }

        async fn current_user(&self) -> Option<ProviderUser> {
            self.current.lock().unwrap().clone()
        }
    }
}
