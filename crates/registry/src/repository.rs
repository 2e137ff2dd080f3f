use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    types::SkillManifest,
};

const MANIFEST_FILE: &str = "manifest.json";
const LOCALES_DIR: &str = "locales";

/// Read access to the skill tree.
///
/// Existence is decided by listing membership: callers check that a skill and
/// tag appear in [`list_skills`](Self::list_skills) /
/// [`list_versions`](Self::list_versions) before reading files.
#[async_trait]
pub trait SkillRepository: Send + Sync {
    /// Names of all skills that are not hidden, sorted.
    async fn list_skills(&self) -> Result<Vec<String>>;

    /// Version tags present on disk for `skill`, sorted.
    async fn list_versions(&self, skill: &str) -> Result<Vec<String>>;

    /// Locale codes available for a version (`en.json` → `en`).
    async fn locales_of(&self, skill: &str, tag: &str) -> Result<Vec<String>>;

    /// Whether `locales/<locale>.json` exists for a version.
    async fn has_locale(&self, skill: &str, tag: &str, locale: &str) -> Result<bool>;

    /// Parsed `manifest.json` of a version.
    async fn manifest_of(&self, skill: &str, tag: &str) -> Result<SkillManifest>;

    /// Directory holding a version. The directory may not exist.
    fn version_dir(&self, skill: &str, tag: &str) -> Result<PathBuf>;

    /// Whether `skill` is an internal entry that must never be exposed.
    fn is_hidden(&self, skill: &str) -> bool;
}

/// [`SkillRepository`] over `<root>/<skill>/<tag>/` directories.
pub struct FsSkillRepository {
    root: PathBuf,
    hidden_prefix: String,
}

impl FsSkillRepository {
    pub fn new(root: PathBuf, hidden_prefix: impl Into<String>) -> Self {
        Self {
            root,
            hidden_prefix: hidden_prefix.into(),
        }
    }

    async fn locale_files(&self, skill: &str, tag: &str) -> Result<Vec<String>> {
        let dir = self.version_dir(skill, tag)?.join(LOCALES_DIR);
        match entry_names(&dir, EntryKind::Any).await {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }
}

#[async_trait]
impl SkillRepository for FsSkillRepository {
    async fn list_skills(&self) -> Result<Vec<String>> {
        let names = match entry_names(&self.root, EntryKind::Dir).await {
            Err(e) if e.is_not_found() => {
                tracing::debug!(root = %self.root.display(), "skills root does not exist");
                return Ok(Vec::new());
            },
            other => other?,
        };
        Ok(names
            .into_iter()
            .filter(|name| !self.is_hidden(name))
            .collect())
    }

    async fn list_versions(&self, skill: &str) -> Result<Vec<String>> {
        let dir = self.root.join(valid_segment(skill)?);
        entry_names(&dir, EntryKind::Dir).await.map_err(|e| {
            if e.is_not_found() {
                Error::not_found(format!("skill '{skill}'"))
            } else {
                e
            }
        })
    }

    async fn locales_of(&self, skill: &str, tag: &str) -> Result<Vec<String>> {
        Ok(self
            .locale_files(skill, tag)
            .await?
            .into_iter()
            .map(|file| locale_code(&file).to_string())
            .collect())
    }

    async fn has_locale(&self, skill: &str, tag: &str, locale: &str) -> Result<bool> {
        let wanted = format!("{locale}.json");
        Ok(self
            .locale_files(skill, tag)
            .await?
            .iter()
            .any(|file| *file == wanted))
    }

    async fn manifest_of(&self, skill: &str, tag: &str) -> Result<SkillManifest> {
        let path = self.version_dir(skill, tag)?.join(MANIFEST_FILE);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(format!("manifest for {skill}/{tag}")));
            },
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    fn version_dir(&self, skill: &str, tag: &str) -> Result<PathBuf> {
        Ok(self.root.join(valid_segment(skill)?).join(valid_segment(tag)?))
    }

    fn is_hidden(&self, skill: &str) -> bool {
        !self.hidden_prefix.is_empty() && skill.starts_with(&self.hidden_prefix)
    }
}

/// Reject names that would leave the directory they are joined onto.
pub fn valid_segment(name: &str) -> Result<&str> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(name)
}

/// Locale code of a locale file name: everything before the first dot.
fn locale_code(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

#[derive(Clone, Copy)]
enum EntryKind {
    Dir,
    Any,
}

async fn entry_names(dir: &Path, kind: EntryKind) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if matches!(kind, EntryKind::Dir) && !entry.file_type().await?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::debug!(?raw, dir = %dir.display(), "skipping non-UTF-8 entry"),
        }
    }
    names.sort();
    Ok(names)
}
