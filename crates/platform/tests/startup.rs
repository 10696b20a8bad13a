use configs::AppConfig;
use platform::startup::bootstrap;
use service::auth::Role;
use service::storage::keys;
use uuid::Uuid;

fn temp_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.data_dir = std::env::temp_dir()
        .join(format!("platform_startup_{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    cfg
}

#[tokio::test]
async fn test_bootstrap_seeds_admin_once() -> anyhow::Result<()> {
    let cfg = temp_config();
    {
        let p = bootstrap(&cfg).await?;
        assert!(p.storage().get_item(keys::IDENTITY_ACCOUNTS).await?.is_some());
        assert!(p.auth.current_user().await.is_none());
    }

    // a second run finds the admin already present
    let p = bootstrap(&cfg).await?;
    let raw: serde_json::Value = p.storage().get_json(keys::IDENTITY_ACCOUNTS).await?.expect("accounts blob");
    assert_eq!(raw["state"].as_object().map(|m| m.len()), Some(1));

    let admin = p.sign_in(&cfg.auth.admin_email, &cfg.auth.admin_password).await?;
    assert_eq!(admin.role, Role::Admin);
    p.sign_out().await?;

    // the local provider matches emails case-insensitively, the admin session role does not
    let variant = cfg.auth.admin_email.to_uppercase();
    p.sign_in(&variant, &cfg.auth.admin_password).await?;
    assert_eq!(p.auth.user_role().await, Role::Reader);
    assert!(!p.auth.is_admin().await);

    let _ = tokio::fs::remove_dir_all(&cfg.storage.data_dir).await;
    Ok(())
}
