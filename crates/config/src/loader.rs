use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::RegistryConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "skillrack.toml",
    "skillrack.yaml",
    "skillrack.yml",
    "skillrack.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<RegistryConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./skillrack.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/skillrack/skillrack.{toml,yaml,yml,json}` (user-global)
///
/// Returns `RegistryConfig::default()` if no config file is found or the one
/// found cannot be parsed.
pub fn discover_and_load() -> RegistryConfig {
    let Some(path) = find_config_file(Path::new("."), config_dir().as_deref()) else {
        debug!("no config file found, using defaults");
        return RegistryConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            RegistryConfig::default()
        },
    }
}

/// Returns the user-global config directory (`~/.config/skillrack/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "skillrack").map(|d| d.config_dir().to_path_buf())
}

fn find_config_file(local_dir: &Path, global_dir: Option<&Path>) -> Option<PathBuf> {
    std::iter::once(local_dir)
        .chain(global_dir)
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RegistryConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
