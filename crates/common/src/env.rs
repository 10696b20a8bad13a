//! Environment/runtime helpers
//!
//! Sanity checks to ensure the local storage directory exists at startup.

use std::path::Path;

use tracing::{info, warn};

/// Ensure the data directory exists and is a directory.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    match tokio::fs::metadata(data_dir).await {
        Ok(meta) if !meta.is_dir() => {
            return Err(anyhow::anyhow!("{data_dir} exists but is not a directory"));
        }
        Ok(_) => {}
        Err(_) => {
            warn!(%data_dir, "data directory not found; creating it");
        }
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    info!(data_dir = %Path::new(data_dir).display(), "local storage ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_dir() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("blogsphere_env_{}", uuid::Uuid::new_v4()));
        let dir_str = dir.to_string_lossy().to_string();
        ensure_data_dir(&dir_str).await?;
        assert!(tokio::fs::metadata(&dir).await?.is_dir());
        // second call is a no-op
        ensure_data_dir(&dir_str).await?;
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_file_path() -> anyhow::Result<()> {
        let file = std::env::temp_dir().join(format!("blogsphere_env_{}.txt", uuid::Uuid::new_v4()));
        tokio::fs::write(&file, b"x").await?;
        assert!(ensure_data_dir(&file.to_string_lossy()).await.is_err());
        let _ = tokio::fs::remove_file(&file).await;
        Ok(())
    }
}
