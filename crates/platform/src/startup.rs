use std::sync::Arc;

use common::{env::ensure_data_dir, utils::logging::init_logging};
use configs::AppConfig;
use dotenvy::dotenv;
use service::{
    auth::{repo::LocalIdentityProvider, AuthConfig, AuthError, IdentityProvider},
    storage::LocalStorage,
};
use tracing::{debug, info};

use crate::Platform;

/// Auth settings as the service layer wants them.
pub fn auth_config(cfg: &AppConfig) -> AuthConfig {
    AuthConfig {
        admin_email: cfg.auth.admin_email.clone(),
        admin_password: cfg.auth.admin_password.clone(),
        jwt_secret: cfg.auth.jwt_secret.clone(),
        session_ttl_hours: cfg.auth.session_ttl_hours,
    }
}

/// Load `.env` and the config file, then bootstrap.
pub async fn run() -> anyhow::Result<Platform<LocalIdentityProvider>> {
    // .env before config so env overrides see it
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    bootstrap(&cfg).await
}

/// Bring up logging, the data directory, every store and the auth service,
/// and make sure the admin account exists.
pub async fn bootstrap(cfg: &AppConfig) -> anyhow::Result<Platform<LocalIdentityProvider>> {
    // no-op if a subscriber is already installed
    init_logging(&cfg.logging.format);
    ensure_data_dir(&cfg.storage.data_dir).await?;

    let storage = LocalStorage::new(&cfg.storage.data_dir).await?;
    let provider = Arc::new(LocalIdentityProvider::open(storage.clone()).await?);
    seed_admin(provider.as_ref(), cfg).await?;
    info!(accounts = provider.account_count().await, "identity store ready");

    // stores rehydrate here; the auth service re-checks a persisted admin role
    let platform = Platform::open(storage, provider, auth_config(cfg)).await?;
    info!(data_dir = %cfg.storage.data_dir, "platform ready");
    Ok(platform)
}

/// Create the admin identity unless it already exists. Leaves nobody signed
/// in at the provider.
pub async fn seed_admin<P: IdentityProvider>(provider: &P, cfg: &AppConfig) -> anyhow::Result<()> {
    match provider.create_user(&cfg.auth.admin_email, &cfg.auth.admin_password).await {
        Ok(user) => {
            provider.sign_out().await?;
            info!(uid = %user.uid, email = %user.email, "admin account seeded");
        }
        Err(AuthError::Conflict) => debug!("admin account already present"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
