//! Screenshot artifacts.
//!
//! Captures write to a caller-chosen path; overwriting an existing file is
//! intentional. Writes go through a temp sibling plus rename so a failure
//! never leaves a partial file behind.

use std::path::Path;

use tracing::info;

use crate::error::HarnessError;
use crate::session::Session;

/// Write `bytes` to `path` atomically from the reader's point of view.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(HarnessError::capture)?;
        }
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".part");
    let staging = std::path::PathBuf::from(staging);

    tokio::fs::write(&staging, bytes)
        .await
        .map_err(HarnessError::capture)?;
    if let Err(err) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(HarnessError::capture(err));
    }
    Ok(())
}

impl Session {
    /// Capture the full page as a PNG at `path`.
    pub async fn capture_page(&self, path: impl AsRef<Path>) -> Result<(), HarnessError> {
        let path = path.as_ref();
        let bytes = self.driver()?.screenshot_page().await?;
        write_atomic(path, &bytes).await?;
        info!(target: "uiprobe::artifact", path = %path.display(), "captured page");
        Ok(())
    }

    /// Capture the first element matching `selector` as a PNG at `path`.
    /// Zero matches fail before any file I/O happens.
    pub async fn capture_element(
        &self,
        selector: &str,
        path: impl AsRef<Path>,
    ) -> Result<(), HarnessError> {
        let path = path.as_ref();
        if self.driver()?.query_count(selector).await? == 0 {
            return Err(HarnessError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        let bytes = self.driver()?.screenshot_element(selector).await?;
        write_atomic(path, &bytes).await?;
        info!(
            target: "uiprobe::artifact",
            selector,
            path = %path.display(),
            "captured element"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_atomic_creates_missing_parents_and_leaves_no_staging_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/shot.png");
        write_atomic(&path, b"png-bytes").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
        let staging = dir.path().join("nested/out/shot.png.part");
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn write_atomic_overwrites_existing_artifacts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
