use std::path::{Path, PathBuf};

use {async_trait::async_trait, tokio::sync::Mutex, tracing::{error, info}};

use crate::{error::Result, types::VersionIndex};

/// Source of truth for which tag is "latest" for each skill.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Read the whole index. Never fails: storage problems yield an empty index.
    async fn load(&self) -> VersionIndex;

    /// First tag recorded for `skill`.
    async fn latest_tag(&self, skill: &str) -> Option<String> {
        self.load().await.latest(skill).map(ToOwned::to_owned)
    }

    /// Prepend `tag` to the skill's list and persist the index.
    async fn record_upload(&self, skill: &str, tag: &str) -> Result<()>;
}

/// Version index kept in a single JSON file, rewritten whole on every upload.
pub struct FileVersionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileVersionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, index: &VersionIndex) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec(index)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }

    async fn read(&self) -> Result<VersionIndex> {
        let data = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Read the index, writing an empty one if the file is missing.
    /// Callers must hold `write_lock`.
    async fn read_or_init(&self) -> VersionIndex {
        match self.read().await {
            Ok(index) => index,
            Err(e) if e.is_not_found() => {
                info!(path = %self.path.display(), "version index missing, creating an empty one");
                let empty = VersionIndex::new();
                if let Err(e) = self.save(&empty).await {
                    error!(path = %self.path.display(), error = %e, "failed to initialise version index");
                }
                empty
            },
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read version index");
                VersionIndex::new()
            },
        }
    }
}

#[async_trait]
impl VersionStore for FileVersionStore {
    async fn load(&self) -> VersionIndex {
        match self.read().await {
            Ok(index) => index,
            Err(e) if e.is_not_found() => {
                // An upload may have created the file since the read above.
                let _guard = self.write_lock.lock().await;
                self.read_or_init().await
            },
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read version index");
                VersionIndex::new()
            },
        }
    }

    async fn record_upload(&self, skill: &str, tag: &str) -> Result<()> {
        // Serializes read-modify-write within this process only.
        let _guard = self.write_lock.lock().await;
        let mut index = self.read_or_init().await;
        index.prepend(skill, tag);
        self.save(&index).await?;
        tracing::debug!(%skill, %tag, "recorded upload in version index");
        Ok(())
    }
}
