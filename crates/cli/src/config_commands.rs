use {anyhow::Result, clap::Subcommand, skillrack_config::RegistryConfig};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the resolved storage paths.
    Paths,
}

pub fn handle_config(action: ConfigAction, config: &RegistryConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let rendered = toml::to_string_pretty(config)
                .map_err(|e| anyhow::anyhow!("serialize config: {e}"))?;
            print!("{rendered}");
        },
        ConfigAction::Paths => {
            let storage = &config.storage;
            println!("skills:   {}", storage.skills_path().display());
            println!("versions: {}", storage.versions_path().display());
            println!("public:   {}", storage.public_path().display());
            if let Some(dir) = skillrack_config::config_dir() {
                println!("config:   {}", dir.display());
            }
        },
    }
    Ok(())
}
