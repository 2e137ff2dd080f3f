//! Skill package storage: the version index, the on-disk skill tree, and the
//! zip codec used for uploads and downloads.
//!
//! A skill lives at `<skills root>/<name>/<tag>/` with a `manifest.json` and a
//! `locales/` directory of `<locale>.json` files. Which tag is "latest" is
//! decided only by the version index, never by the filesystem.

pub mod archive;
pub mod error;
pub mod repository;
pub mod types;
pub mod version_store;

pub use {
    error::{Error, Result},
    repository::{FsSkillRepository, SkillRepository},
    types::{SkillManifest, VersionIndex},
    version_store::{FileVersionStore, VersionStore},
};
