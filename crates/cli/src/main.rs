mod gateway_commands;

use std::{io::IsTerminal, path::PathBuf};

use {
    clap::{Parser, Subcommand},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "gatelink", about = "gatelink: API gateway registration client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file. Defaults to ./gatelink.toml, then ~/.config/gatelink/.
    #[arg(long, global = true, env = "GATELINK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway answers.
    Ping,
    /// Read the registration credential once (never printed).
    Token,
    /// Print the routes a manifest would publish, without contacting the gateway.
    Routes {
        #[arg(long)]
        manifest: PathBuf,
        /// Owning service name; defaults to `service.name` from config.
        #[arg(long)]
        service: Option<String>,
    },
    /// Register, publish the manifest's routes and heartbeat until Ctrl-C.
    Connect {
        #[arg(long)]
        manifest: PathBuf,
    },
}

/// Logs go to stderr so `routes` output on stdout stays machine-readable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(std::io::stderr().is_terminal()),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "gatelink starting");

    let config = match &cli.config {
        Some(path) => gatelink_config::load_config(path)?,
        None => gatelink_config::discover_and_load(),
    };
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Ping => gateway_commands::ping(&config).await,
        Commands::Token => gateway_commands::token(&config).await,
        Commands::Routes { manifest, service } => {
            gateway_commands::routes(&config, &manifest, service.as_deref())
        },
        Commands::Connect { manifest } => gateway_commands::connect(&config, &manifest).await,
    }
}
