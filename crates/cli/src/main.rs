mod config_commands;
mod index_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    skillrack_config::RegistryConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "skillrack", about = "Skillrack: versioned skill package registry")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of searching the standard locations.
    #[arg(long, global = true, env = "SKILLRACK_CONFIG")]
    config: Option<PathBuf>,
    /// Address to bind to (overrides config value).
    #[arg(long, global = true, env = "SKILLRACK_BIND")]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true, env = "SKILLRACK_PORT")]
    port: Option<u16>,
    /// Storage root holding `skills/`, `config/` and `public/` (overrides config value).
    #[arg(long, global = true, env = "SKILLRACK_ROOT")]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registry server (default when no subcommand is provided).
    Serve,
    /// Show the version index.
    Index {
        /// Only show the tags of this skill, latest first.
        skill: Option<String>,
    },
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the config file, then apply command-line overrides on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    let mut config = match cli.config {
        Some(ref path) => skillrack_config::load_config(path)?,
        None => skillrack_config::discover_and_load(),
    };

    if let Some(ref bind) = cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref root) = cli.root {
        config.storage.root = root.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    let config = resolve_config(&cli)?;

    match cli.command {
        None | Some(Commands::Serve) => {
            info!(version = env!("CARGO_PKG_VERSION"), "skillrack starting");
            let bind = config.server.bind.clone();
            let port = config.server.port;
            skillrack_gateway::server::start_server(&bind, port, config).await
        },
        Some(Commands::Index { skill }) => {
            index_commands::show_index(&config, skill.as_deref()).await
        },
        Some(Commands::Config { action }) => config_commands::handle_config(action, &config),
    }
}
