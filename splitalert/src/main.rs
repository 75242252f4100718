use alert_router::config::{ForwardingConfig, Listener};
use alert_router::config_store::ConfigStore;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "/opt/splitAlert/config/config.yml";

#[derive(Parser, Debug)]
#[command(name = "splitalert", version, about = "Splits alert webhooks by status and relays them")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Serve `/alert` and `/reload`
    Run(RunArgs),
    /// Validate a config file and exit
    CheckConfig(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(long, env = "SPLITALERT_CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(long, env = "SPLITALERT_HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "SPLITALERT_PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        CliCommand::Run(args) => run(args).await,
        CliCommand::CheckConfig(args) => check_config(args),
    }
}

async fn run(args: RunArgs) {
    tracing::info!("Starting alert router");

    let config_path = args.config.config_path;
    let store = match ConfigStore::open(&config_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(path = %config_path.display(), error = %e, "Failed to load config");
            process::exit(1);
        }
    };

    let listener = Listener {
        host: args.host,
        port: args.port,
    };
    if let Err(e) = alert_router::run(listener, store, config_path).await {
        tracing::error!(error = %e, "Alert router stopped");
        process::exit(1);
    }
}

fn check_config(args: ConfigArgs) {
    match ForwardingConfig::from_file(&args.config_path) {
        Ok(config) => {
            println!(
                "{}: ok, {} config(s) forwarding to {}",
                args.config_path.display(),
                config.entries.len(),
                config.base_url
            );
            let mut names: Vec<_> = config.entries.keys().collect();
            names.sort();
            for name in names {
                println!("  {name}");
            }
        }
        Err(e) => {
            eprintln!("{}: {e}", args.config_path.display());
            process::exit(1);
        }
    }
}
