use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Version index ───────────────────────────────────────────────────────────

/// Skill name → version tags, latest first.
///
/// Serialized as a plain JSON object (`{"weather": ["v2", "v1"]}`). Tags are
/// never deduplicated and may name versions that no longer exist on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionIndex(BTreeMap<String, Vec<String>>);

impl VersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag at position 0 for `skill`, if any.
    pub fn latest(&self, skill: &str) -> Option<&str> {
        self.0.get(skill)?.first().map(String::as_str)
    }

    pub fn tags(&self, skill: &str) -> &[String] {
        self.0.get(skill).map(Vec::as_slice).unwrap_or_default()
    }

    /// Put `tag` in front of the skill's list, creating the entry if needed.
    pub fn prepend(&mut self, skill: &str, tag: &str) {
        self.0
            .entry(skill.to_string())
            .or_default()
            .insert(0, tag.to_string());
    }

    pub fn skills(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for VersionIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Version manifest ────────────────────────────────────────────────────────

/// `manifest.json` of a single skill version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillManifest {
    /// Version declared by the author. Usually a string, but any JSON value is
    /// accepted and echoed back unchanged. Required.
    pub version: serde_json::Value,
    /// Declared dependencies, passed through to clients untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<serde_json::Value>,
}
