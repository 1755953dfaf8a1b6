//! Filesystem infrastructure: implements `LocalFiles` with `tokio::fs`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::LocalFiles;

/// Production filesystem implementation of `LocalFiles`.
pub struct LocalFs;

impl LocalFiles for LocalFs {
    async fn size(&self, path: &Path) -> Result<u64> {
        let meta = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("reading metadata of {}", path.display()))?;
        if !meta.is_file() {
            anyhow::bail!("{} is not a regular file", path.display());
        }
        Ok(meta.len())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .with_context(|| format!("reading file {}", path.display()))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("writing file {}", path.display()))
    }
}
