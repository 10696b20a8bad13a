use std::future::Future;
use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthSession, AuthSnapshot, ProviderUser, Role, SessionClaims, SignInInput, SignUpInput};
use super::errors::AuthError;
use super::provider::IdentityProvider;
use crate::storage::{keys, LocalStorage, PersistedState};

/// Display name forced onto the admin account.
pub const ADMIN_DISPLAY_NAME: &str = "Admin";

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub admin_email: String,
    pub admin_password: String,
    /// Session tokens are only issued when set.
    pub jwt_secret: Option<String>,
    pub session_ttl_hours: i64,
}

impl AuthConfig {
    /// Exact match only; a case or whitespace variant is a different account.
    fn is_admin_email(&self, email: &str) -> bool {
        email == self.admin_email
    }
}

#[derive(Debug, Default)]
struct AuthStatus {
    loading: bool,
    error: Option<String>,
}

/// Auth store: resolves roles on top of an identity provider and persists
/// the signed-in session under `auth-storage`.
pub struct AuthService<P: IdentityProvider> {
    provider: Arc<P>,
    cfg: AuthConfig,
    state: PersistedState<AuthSnapshot>,
    status: RwLock<AuthStatus>,
}

impl<P: IdentityProvider> AuthService<P> {
    /// Rehydrate the persisted session.
    ///
    /// A stored admin role survives only if it can be proven: with a secret
    /// configured the stored token must verify and carry the admin role,
    /// without one the stored email must be the admin email.
    pub async fn open(storage: LocalStorage, provider: Arc<P>, cfg: AuthConfig) -> Result<Self, AuthError> {
        let state = PersistedState::open(storage, keys::AUTH)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        let svc = Self { provider, cfg, state, status: RwLock::new(AuthStatus::default()) };

        let snapshot = svc.state.snapshot().await;
        if snapshot.user_role == Role::Admin && !svc.admin_claim_holds(&snapshot) {
            warn!(
                uid = snapshot.user.as_ref().map(|u| u.uid.as_str()).unwrap_or("-"),
                "persisted admin role could not be verified; downgrading to reader"
            );
            svc.persist(|s| s.user_role = Role::Reader).await?;
        }
        Ok(svc)
    }

    fn admin_claim_holds(&self, snapshot: &AuthSnapshot) -> bool {
        let Some(user) = &snapshot.user else { return false };
        match &self.cfg.jwt_secret {
            Some(_) => snapshot
                .token
                .as_deref()
                .and_then(|t| self.verify_token(t).ok())
                .is_some_and(|c| c.role == Role::Admin && c.sub == user.uid),
            None => self.cfg.is_admin_email(&user.email),
        }
    }

    /// Register a new account. The session role is always reader.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, Role, provider::mock::MockIdentityProvider};
    /// use service::auth::domain::SignUpInput;
    /// use service::storage::LocalStorage;
    /// use std::sync::Arc;
    /// tokio_test::block_on(async {
    ///     let dir = std::env::temp_dir().join(format!("auth_doc_{}", uuid::Uuid::new_v4()));
    ///     let storage = LocalStorage::new(&dir).await.unwrap();
    ///     let cfg = AuthConfig { admin_email: "admin@x.io".into(), admin_password: "ilovebooks".into(), jwt_secret: None, session_ttl_hours: 12 };
    ///     let svc = AuthService::open(storage, Arc::new(MockIdentityProvider::default()), cfg).await.unwrap();
    ///     let input = SignUpInput { email: "user@example.com".into(), password: "Secret123".into(), display_name: "Ann".into() };
    ///     let session = svc.sign_up(input).await.unwrap();
    ///     assert_eq!(session.user.display_name.as_deref(), Some("Ann"));
    ///     assert_eq!(session.role, Role::Reader);
    /// });
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<AuthSession, AuthError> {
        self.track("sign_up", async {
            let created = self.provider.create_user(&input.email, &input.password).await?;
            let name = if self.cfg.is_admin_email(&input.email) { ADMIN_DISPLAY_NAME } else { input.display_name.as_str() };
            let user = self.provider.update_profile(&created.uid, Some(name), None).await?;
            let session = self.establish(user, Role::Reader).await?;
            info!(uid = %session.user.uid, "account registered");
            Ok::<_, AuthError>(session)
        })
        .await
    }

    /// Authenticate and resolve the role. Admin requires the exact admin
    /// credentials; anything else is a reader.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, Role, provider::mock::MockIdentityProvider};
    /// use service::auth::domain::{SignUpInput, SignInInput};
    /// use service::storage::LocalStorage;
    /// use std::sync::Arc;
    /// tokio_test::block_on(async {
    ///     let dir = std::env::temp_dir().join(format!("auth_doc_{}", uuid::Uuid::new_v4()));
    ///     let storage = LocalStorage::new(&dir).await.unwrap();
    ///     let cfg = AuthConfig { admin_email: "admin@x.io".into(), admin_password: "ilovebooks".into(), jwt_secret: Some("secret".into()), session_ttl_hours: 12 };
    ///     let svc = AuthService::open(storage, Arc::new(MockIdentityProvider::default()), cfg).await.unwrap();
    ///     svc.sign_up(SignUpInput { email: "admin@x.io".into(), password: "ilovebooks".into(), display_name: "Me".into() }).await.unwrap();
    ///     let session = svc.sign_in(SignInInput { email: "admin@x.io".into(), password: "ilovebooks".into() }).await.unwrap();
    ///     assert_eq!(session.role, Role::Admin);
    ///     assert!(session.token.is_some());
    /// });
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_in(&self, input: SignInInput) -> Result<AuthSession, AuthError> {
        self.track("sign_in", async {
            let mut user = self.provider.sign_in(&input.email, &input.password).await?;
            let role = if self.cfg.is_admin_email(&input.email) && input.password == self.cfg.admin_password {
                user = self.provider.update_profile(&user.uid, Some(ADMIN_DISPLAY_NAME), None).await?;
                Role::Admin
            } else {
                Role::Reader
            };
            let session = self.establish(user, role).await?;
            info!(uid = %session.user.uid, role = %session.role, "user signed in");
            Ok::<_, AuthError>(session)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.track("logout", async {
            self.provider.sign_out().await?;
            self.persist(|s| *s = AuthSnapshot::default()).await?;
            info!("user signed out");
            Ok::<_, AuthError>(())
        })
        .await
    }

    /// Update the signed-in user's display name and photo. The admin account
    /// keeps its fixed name. Returns `None` when nobody is signed in.
    ///
    /// The persisted session decides who is signed in, so this works after a
    /// restart even though the provider's current user is not persisted.
    #[instrument(skip(self, photo_url))]
    pub async fn update_user_profile(&self, display_name: &str, photo_url: Option<&str>) -> Result<Option<ProviderUser>, AuthError> {
        self.track("update_user_profile", async {
            let Some(current) = self.current_user().await else {
                debug!("profile update without a signed-in user");
                return Ok(None);
            };
            let name = if self.cfg.is_admin_email(&current.email) { ADMIN_DISPLAY_NAME } else { display_name };
            let user = self.provider.update_profile(&current.uid, Some(name), photo_url).await?;
            let stored = user.clone();
            self.persist(|s| s.user = Some(stored)).await?;
            Ok::<_, AuthError>(Some(user))
        })
        .await
    }

    /// Provider listener: the admin email always maps to admin with the
    /// fixed display name, any other user (or none) to reader.
    #[instrument(skip(self, user), fields(uid = user.as_ref().map(|u| u.uid.as_str()).unwrap_or("-")))]
    pub async fn on_auth_state_changed(&self, user: Option<ProviderUser>) -> Result<Role, AuthError> {
        self.track("on_auth_state_changed", async {
            match user {
                Some(user) if self.cfg.is_admin_email(&user.email) => {
                    let user = self.provider.update_profile(&user.uid, Some(ADMIN_DISPLAY_NAME), None).await?;
                    Ok(self.establish(user, Role::Admin).await?.role)
                }
                Some(user) => Ok::<_, AuthError>(self.establish(user, Role::Reader).await?.role),
                None => {
                    self.persist(|s| *s = AuthSnapshot::default()).await?;
                    Ok(Role::Reader)
                }
            }
        })
        .await
    }

    pub async fn current_user(&self) -> Option<ProviderUser> {
        self.state.read(|s| s.user.clone()).await
    }

    pub async fn user_role(&self) -> Role {
        self.state.read(|s| s.user_role).await
    }

    pub async fn session_token(&self) -> Option<String> {
        self.state.read(|s| s.token.clone()).await
    }

    pub async fn is_admin(&self) -> bool {
        self.state.read(|s| s.user.is_some() && s.user_role == Role::Admin).await
    }

    pub async fn is_loading(&self) -> bool {
        self.status.read().await.loading
    }

    /// Message of the last failed operation; cleared when the next one starts.
    pub async fn last_error(&self) -> Option<String> {
        self.status.read().await.error.clone()
    }

    pub fn config(&self) -> &AuthConfig {
        &self.cfg
    }

    /// Decode and validate a session token issued by this service.
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let secret = self
            .cfg
            .jwt_secret
            .as_ref()
            .ok_or_else(|| AuthError::TokenError("no signing secret configured".into()))?;
        let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::new(Algorithm::HS256))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(data.claims)
    }

    fn issue_token(&self, user: &ProviderUser, role: Role) -> Result<Option<String>, AuthError> {
        let Some(secret) = &self.cfg.jwt_secret else { return Ok(None) };
        let now = chrono::Utc::now();
        let expires = chrono::Duration::try_hours(self.cfg.session_ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .and_then(|ttl| now.checked_add_signed(ttl))
            .and_then(|at| usize::try_from(at.timestamp()).ok())
            .ok_or_else(|| AuthError::TokenError(format!("session ttl of {} hours is out of range", self.cfg.session_ttl_hours)))?;
        let claims = SessionClaims {
            sub: user.uid.clone(),
            email: user.email.clone(),
            role,
            iat: now.timestamp() as usize,
            exp: expires,
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(Some(token))
    }

    async fn establish(&self, user: ProviderUser, role: Role) -> Result<AuthSession, AuthError> {
        let token = self.issue_token(&user, role)?;
        let snapshot = AuthSnapshot { user: Some(user.clone()), user_role: role, token: token.clone() };
        self.persist(|s| *s = snapshot).await?;
        Ok(AuthSession { user, role, token })
    }

    async fn persist(&self, f: impl FnOnce(&mut AuthSnapshot)) -> Result<(), AuthError> {
        self.state.update(f).await.map_err(|e| AuthError::Repository(e.to_string()))
    }

    async fn track<T>(&self, op: &'static str, fut: impl Future<Output = Result<T, AuthError>>) -> Result<T, AuthError> {
        {
            let mut status = self.status.write().await;
            status.loading = true;
            status.error = None;
        }
        let res = fut.await;
        let mut status = self.status.write().await;
        status.loading = false;
        if let Err(e) = &res {
            warn!(op, code = e.code(), error = %e, "auth operation failed");
            status.error = Some(e.to_string());
        }
        res
    }
}
