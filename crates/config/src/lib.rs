//! Configuration loading and env substitution for the skill registry.
//!
//! Config files: `skillrack.toml`, `skillrack.yaml`, `skillrack.yml` or
//! `skillrack.json`, searched in `./` then `~/.config/skillrack/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{RegistryConfig, ServerConfig, StorageConfig, UploadConfig},
};
