use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the local storage blobs live.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

/// Upper bound on `auth.session_ttl_hours` (one year).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// The single admin credential pair and session token settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
            jwt_secret: None,
            session_ttl_hours: default_session_ttl(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_admin_email() -> String { "admin@blogsphere.local".into() }
fn default_admin_password() -> String { "ilovebooks".into() }
fn default_session_ttl() -> i64 { 12 }
fn default_log_format() -> String { "compact".into() }

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), apply env overrides and validate.
    /// A missing file means defaults; a malformed one is an error.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_env_overrides();
        self.storage.validate()?;
        self.auth.validate()?;
        self.logging.normalize()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            self.auth.admin_email = email;
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            self.auth.admin_password = password;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        Ok(())
    }
}

impl AuthSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.admin_email.contains('@') {
            return Err(anyhow!("auth.admin_email must be an email address"));
        }
        if self.admin_password.chars().count() < 6 {
            return Err(anyhow!("auth.admin_password must be at least 6 characters"));
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(anyhow!("auth.session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"));
        }
        if matches!(&self.jwt_secret, Some(s) if s.trim().is_empty()) {
            return Err(anyhow!("auth.jwt_secret must not be blank when set"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn normalize(&mut self) -> Result<()> {
        self.format = self.format.trim().to_ascii_lowercase();
        if self.format.is_empty() {
            self.format = default_log_format();
        }
        match self.format.as_str() {
            "compact" | "json" => Ok(()),
            other => Err(anyhow!("logging.format must be compact or json, got {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.auth.session_ttl_hours, 12);
        assert!(cfg.auth.jwt_secret.is_none());
        assert_eq!(cfg.logging.format, "compact");
    }

    #[test]
    fn parses_sections() {
        let raw = r#"
            [storage]
            data_dir = "/var/lib/blogsphere"

            [auth]
            admin_email = "root@example.com"
            admin_password = "hunter22"
            jwt_secret = "s3cret"

            [logging]
            format = "JSON"
        "#;
        let mut cfg: AppConfig = toml::from_str(raw).unwrap();
        cfg.logging.normalize().unwrap();
        assert_eq!(cfg.storage.data_dir, "/var/lib/blogsphere");
        assert_eq!(cfg.auth.admin_email, "root@example.com");
        assert_eq!(cfg.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.logging.format, "json");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut auth = AuthSettings::default();
        auth.admin_email = "nobody".into();
        assert!(auth.validate().is_err());

        let mut auth = AuthSettings::default();
        auth.session_ttl_hours = 0;
        assert!(auth.validate().is_err());

        let mut auth = AuthSettings::default();
        auth.session_ttl_hours = MAX_SESSION_TTL_HOURS + 1;
        assert!(auth.validate().is_err());
        auth.session_ttl_hours = i64::MAX;
        assert!(auth.validate().is_err());
        auth.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(auth.validate().is_ok());

        let mut auth = AuthSettings::default();
        auth.jwt_secret = Some("  ".into());
        assert!(auth.validate().is_err());

        let storage = StorageConfig { data_dir: " ".into() };
        assert!(storage.validate().is_err());

        let mut logging = LoggingConfig { format: "pretty".into() };
        assert!(logging.normalize().is_err());
    }

    #[test]
    fn load_from_file_reads_toml() {
        let path = std::env::temp_dir().join(format!("blogsphere_cfg_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[storage]\ndata_dir = \"store\"\n").unwrap();
        let cfg = load_from_file(&path.to_string_lossy()).unwrap();
        assert_eq!(cfg.storage.data_dir, "store");
        let _ = std::fs::remove_file(&path);
    }
}
