//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;
use tracing::debug;

/// Make sure the parent directory of a session file exists.
pub async fn ensure_parent_dir(file: &str) -> anyhow::Result<()> {
    let Some(parent) = Path::new(file).parent() else { return Ok(()) };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
    debug!(dir = %parent.display(), "session storage directory ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_parent() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("env_{}", uuid::Uuid::new_v4()));
        let file = dir.join("nested").join("session.json");
        ensure_parent_dir(file.to_str().unwrap()).await?;
        assert!(tokio::fs::metadata(dir.join("nested")).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn bare_file_name_is_fine() -> anyhow::Result<()> {
        ensure_parent_dir("session.json").await
    }
}
