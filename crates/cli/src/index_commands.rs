use {
    anyhow::Result,
    skillrack_config::RegistryConfig,
    skillrack_registry::{FileVersionStore, VersionIndex, VersionStore},
};

/// Print the version index, or the tags of one skill.
pub async fn show_index(config: &RegistryConfig, skill: Option<&str>) -> Result<()> {
    let store = FileVersionStore::new(config.storage.versions_path());
    let index = store.load().await;
    print!("{}", render_index(&index, skill));
    Ok(())
}

fn render_index(index: &VersionIndex, skill: Option<&str>) -> String {
    let mut out = String::new();
    match skill {
        Some(skill) => {
            let tags = index.tags(skill);
            if tags.is_empty() {
                out.push_str(&format!("No versions recorded for '{skill}'.\n"));
            }
            for (i, tag) in tags.iter().enumerate() {
                let marker = if i == 0 { " (latest)" } else { "" };
                out.push_str(&format!("  {tag}{marker}\n"));
            }
        },
        None if index.is_empty() => out.push_str("No skills recorded.\n"),
        None => {
            for name in index.skills() {
                let tags = index.tags(name);
                out.push_str(&format!(
                    "  {name}: {} ({} upload(s))\n",
                    index.latest(name).unwrap_or("-"),
                    tags.len()
                ));
            }
        },
    }
    out
}
