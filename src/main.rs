use std::path::PathBuf;

use clap::Parser;
use homestead_lib::bootstrap::{self, tracing::init_tracing_subscriber};
use tracing::error;

#[derive(Debug, Parser)]
#[command(name = "homestead", about = "Index sync and signup support service")]
struct Cli {
    /// Path to a TOML config file. Environment variables override its values.
    #[arg(short, long, env = "HOMESTEAD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = bootstrap::resolve_config(cli.config);
    let logs_dir = match &config {
        Ok(config) if !config.data_dir.as_os_str().is_empty() => config.data_dir.join("logs"),
        _ => hs_infra::fs::logs_dir()?,
    };
    init_tracing_subscriber(&logs_dir)?;

    let config = config.map_err(|err| {
        error!(error = %err, "failed to load configuration");
        err
    })?;

    bootstrap::run_app(config).await
}
