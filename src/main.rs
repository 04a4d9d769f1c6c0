//! sitepush - Entry point
//!
//! Parses CLI arguments, validates configuration, runs the deployment, and
//! maps the outcome onto the process exit code. Logs go to stderr; stdout
//! carries only the dry-run decision report and the final summary line.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sitepush::config::{Args, Config};
use sitepush::deploy::Deployment;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Bad flags and --help exit here with codes 2 and 0 respectively.
    let args = Args::parse();

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    info!("sitepush v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Deploying {} to {}@{}:{}",
        config.source.display(),
        config.user,
        config.host,
        config.remote_path
    );
    if config.dry_run {
        info!("Dry run: the remote tree will not be modified");
    }

    match Deployment::new(config).run().await {
        Ok(outcome) => {
            println!("{}", outcome.summary);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}
