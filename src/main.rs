//! zero-bot
//!
//! Loads keys and proxies, then runs the mint → swap → upload pipeline for
//! every account once per day until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zero_bot::chain::AlloyConnector;
use zero_bot::proxy::ProxyPool;
use zero_bot::wallet::load_accounts;
use zero_bot::{BatchDriver, Config, Phases};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Comma separated subset of phases to run (mint,swap,upload)
    #[arg(long)]
    phases: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose, args.json_logs) {
        eprintln!("Failed to initialize logging: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        error!("❌ Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    info!("🚀 Starting zero-bot v{}", env!("CARGO_PKG_VERSION"));

    info!("📋 Loading configuration from: {}", args.config);
    let config = load_config(&args.config)?;
    config.validate().context("Invalid configuration")?;

    let accounts = load_accounts(&config.files.key_file).context("Failed to load wallets")?;
    let proxies = ProxyPool::load(&config.files.proxy_file);
    let connector = AlloyConnector::new(&config.network.rpc_url)?;
    info!("🌐 RPC: {}", connector.rpc_url());

    let mut driver = BatchDriver::new(config, connector, accounts, proxies);
    if let Some(list) = args.phases.as_deref() {
        driver = driver.with_phases(Phases::parse(list)?);
    }
    info!("🎯 Phases: {:?}", driver.phases());

    tokio::select! {
        _ = driver.run(args.once) => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("🛑 Ctrl-C received, shutting down");
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "zero_bot=debug,info"
    } else {
        "zero_bot=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        dotenvy::dotenv().ok();
        let mut config = Config::default();
        config.apply_env();
        Ok(config)
    }
}
