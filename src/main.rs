use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

use live_relay::config::{RelayConfig, TenancyMode};
use live_relay::credentials::{self, DATABASE_CREDENTIALS_VAR};
use live_relay::server;
use live_relay::store::open_status_store;

#[derive(Parser, Debug)]
#[command(author, version, about = "Provision live streams and relay their status from platform webhooks")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP relay
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides config file and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Status document addressing (overrides config file and TENANCY)
        #[arg(short, long, value_enum)]
        tenancy: Option<TenancyMode>,
    },
    /// Create the status store schema and exit
    InitDb,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Serve {
            config,
            port,
            tenancy,
        } => serve(config, port, tenancy),
        Command::InitDb => init_db(),
    }
}

fn serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    tenancy: Option<TenancyMode>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = RelayConfig::load(config_path.as_deref())?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(tenancy) = tenancy {
        config.tenancy = tenancy;
    }
    config.validate()?;

    // Missing or unparsable credentials are fatal
    let credentials = credentials::load_credentials().map_err(|e| {
        error!("{}", e);
        e
    })?;
    info!("Video platform credentials loaded");

    server::serve(config, credentials)
}

fn init_db() -> Result<(), Box<dyn std::error::Error>> {
    let blob = std::env::var(DATABASE_CREDENTIALS_VAR)
        .map_err(|_| format!("{} is not set", DATABASE_CREDENTIALS_VAR))?;
    let database = credentials::parse_database_credentials(&blob)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(open_status_store(&database))?;
    info!("Status store schema is ready");
    Ok(())
}
