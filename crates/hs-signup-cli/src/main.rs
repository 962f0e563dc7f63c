use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use hs_app::SignupOrchestrator;
use hs_core::ports::AccountRegistrationPort;
use hs_core::signup::{FieldValue, FieldValues, Role, WizardState};
use hs_infra::signup::{FileCheckpointRepository, HttpDuplicateAccountChecker};
use hs_infra::SystemClock;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signup-wizard")]
#[command(about = "Step through the marketplace signup wizard", long_about = None)]
struct Cli {
    /// Checkpoint file (defaults to the application data directory)
    #[arg(long, env = "HOMESTEAD_SIGNUP_CHECKPOINT")]
    checkpoint: Option<PathBuf>,

    /// Base URL of the Homestead server used for duplicate-account checks
    #[arg(long, env = "HOMESTEAD_API_URL", default_value = "http://127.0.0.1:3000")]
    api: String,

    /// Duplicate-check timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current wizard state
    Show,
    /// Set a field value
    Set {
        name: String,
        /// JSON value; anything that is not valid JSON is stored as text
        value: String,
        /// Store the value as text even if it parses as JSON
        #[arg(long)]
        text: bool,
    },
    /// Remove a field value
    Clear { name: String },
    /// Validate the current step and advance
    Next,
    /// Go back one step
    Back,
    /// Create the account from the collected values
    Submit,
    /// Discard the wizard and its checkpoint
    Abandon,
}

/// Prints the registration payload instead of calling the marketplace.
struct PrintingRegistration;

#[async_trait]
impl AccountRegistrationPort for PrintingRegistration {
    async fn register(&self, role: Role, values: &FieldValues) -> Result<()> {
        let payload = serde_json::json!({ "role": role.to_string(), "values": values });
        println!("register: {}", serde_json::to_string_pretty(&payload)?);
        Ok(())
    }
}

/// Fields kept verbatim even when they look like JSON.
const TEXT_FIELDS: &[&str] = &["password"];

fn parse_value(name: &str, raw: &str, force_text: bool) -> FieldValue {
    if force_text || TEXT_FIELDS.contains(&name) {
        return FieldValue::text(raw);
    }
    serde_json::from_str(raw).unwrap_or_else(|_| FieldValue::text(raw))
}

fn print_state(state: &WizardState) -> Result<()> {
    println!(
        "step {}/{}: {}",
        state.step_index() + 1,
        state.steps().len(),
        state.current_step
    );
    if let Some(error) = &state.error {
        println!("error: {error}");
    }
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}

fn checkpoint_store(path: Option<PathBuf>) -> Result<FileCheckpointRepository> {
    match path {
        Some(path) => Ok(FileCheckpointRepository::new(path)),
        None => Ok(FileCheckpointRepository::with_defaults(
            hs_infra::fs::signup_dir()?,
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let duplicate_check =
        HttpDuplicateAccountChecker::new(&cli.api, Duration::from_secs(cli.timeout_secs))
            .context("Failed to build duplicate-account checker")?;
    let orchestrator = SignupOrchestrator::new(
        Arc::new(checkpoint_store(cli.checkpoint)?),
        Arc::new(duplicate_check),
        Arc::new(PrintingRegistration),
        Arc::new(SystemClock),
    );

    let restored = orchestrator.restore().await?;
    let state = match cli.command {
        Commands::Show => restored,
        Commands::Set { name, value, text } => {
            orchestrator
                .set_field(name.clone(), parse_value(&name, &value, text))
                .await?
        }
        Commands::Clear { name } => orchestrator.clear_field(name).await?,
        Commands::Next => orchestrator.next().await?,
        Commands::Back => orchestrator.back().await?,
        Commands::Submit => orchestrator.submit().await?,
        Commands::Abandon => orchestrator.abandon().await?,
    };

    print_state(&state)
}
