//! hetzner-ddns - dynamic DNS client for Hetzner DNS
//!
//! Architecture:
//! - Periodic polling of an HTTP "what is my IP" service
//! - Zone and record lookup by name through the Hetzner DNS API
//! - Update only when the address differs from the last committed one
//! - Health and status endpoints served with axum
//! - Uses reqwest for HTTP (rustls)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use hetzner_ddns::config::Config;
use hetzner_ddns::constants::ENV_FILE_NAME;
use hetzner_ddns::daemon::Daemon;
use hetzner_ddns::env_file::{
    load_env_file, prompt_overwrite_stdin, write_sample_env_file, WriteOutcome,
};
use hetzner_ddns::health::HealthState;
use hetzner_ddns::hetzner::HetznerClient;
use hetzner_ddns::ip_source::HttpIpSource;
use hetzner_ddns::pipeline::{UpdatePipeline, UpdateTarget};

//==============================================================================
// Main
//==============================================================================

#[derive(Debug, Parser)]
#[command(name = "hetzner-ddns")]
#[command(version, about)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write a sample .env file and exit
    #[arg(long)]
    create_env_file: bool,

    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Env file to load (or to create with --create-env-file)
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.create_env_file {
        let path = args
            .env_file
            .unwrap_or_else(|| PathBuf::from(ENV_FILE_NAME));
        match write_sample_env_file(&path, prompt_overwrite_stdin)? {
            WriteOutcome::Created => println!("Created {}", path.display()),
            WriteOutcome::Overwritten => println!("Overwrote {}", path.display()),
            WriteOutcome::Kept => println!("Kept existing {}", path.display()),
        }
        println!("Edit it with your Hetzner DNS API token and domain settings.");
        return Ok(());
    }

    let env_file = load_env_file(args.env_file.as_deref())?;
    let mut config = Config::load(args.config).context("Config load failed")?;
    config.verbose |= args.verbose;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("hetzner-ddns v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    let client = HetznerClient::new(config.api_token.as_str(), config.timeout)
        .context("Hetzner client failed")?;
    let ip_source =
        HttpIpSource::new(&config.ipv4_url, config.timeout).context("IP source failed")?;

    let pipeline = UpdatePipeline::new(
        UpdateTarget::from(&config),
        Arc::new(ip_source),
        Arc::new(client),
    );

    let mut daemon = Daemon::new(Arc::new(config), pipeline, HealthState::new());
    daemon.run().await?;

    Ok(())
}
