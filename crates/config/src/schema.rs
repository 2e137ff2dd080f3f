use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0".
    pub bind: String,
    /// Port to listen on. Defaults to 3000.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

/// Where skills, the version index and static assets live on disk.
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    /// Skills tree: `<skills_dir>/<name>/<tag>/...`.
    pub skills_dir: PathBuf,
    /// JSON file mapping skill name to its tags, latest first.
    pub versions_file: PathBuf,
    /// Static files served for any unmatched route.
    pub public_dir: PathBuf,
    /// Skill directories starting with this prefix are never listed or served.
    pub hidden_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            skills_dir: PathBuf::from("skills"),
            versions_file: PathBuf::from("config/versions.json"),
            public_dir: PathBuf::from("public"),
            hidden_prefix: "_".into(),
        }
    }
}

impl StorageConfig {
    /// Storage rooted at `root` with every other setting at its default.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn skills_path(&self) -> PathBuf {
        self.root.join(&self.skills_dir)
    }

    pub fn versions_path(&self) -> PathBuf {
        self.root.join(&self.versions_file)
    }

    pub fn public_path(&self) -> PathBuf {
        self.root.join(&self.public_dir)
    }
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum request body accepted by `POST /upload`, in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 25 * 1024 * 1024,
        }
    }
}
