//! CLI entry point for intune-profiles.
//!
//! Authenticates with an Azure AD app registration (client credentials),
//! then runs one profile operation against Microsoft Graph and prints the
//! JSON response.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (auth failure, API error, unreadable payload file)
//! - 2: argument validation error (clap handles this automatically)

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use intune_profiles::auth::ClientSecretCredential;
use intune_profiles::client::{DEFAULT_ENDPOINT, IntuneClient, JsonObject};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Azure AD tenant ID.
    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: String,

    /// Azure AD application (client) ID.
    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: String,

    /// Azure AD client secret. Prefer the environment variable so the
    /// secret stays out of process listings and shell history.
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    secret: String,

    /// Microsoft Graph root to send requests to.
    #[arg(long, env = "INTUNE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    /// RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a device configuration profile from a JSON file.
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// Patch an existing profile with the fields in a JSON file.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a profile.
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Replace a profile's assignments with the JSON file's contents.
    Assign {
        #[arg(long)]
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads a payload file that must hold a single JSON object.
fn read_payload(path: &Path) -> Result<JsonObject, Box<dyn std::error::Error + Send + Sync>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let payload = serde_json::from_str(&content)
        .map_err(|e| format!("{} is not a JSON object: {e}", path.display()))?;
    Ok(payload)
}

async fn run(cli: Cli) -> Result<Option<JsonObject>, Box<dyn std::error::Error + Send + Sync>> {
    let credential = ClientSecretCredential::new(
        &cli.tenant_id,
        &cli.client_id,
        SecretString::from(cli.secret),
    );
    let client = IntuneClient::with_endpoint(Arc::new(credential), &cli.endpoint);

    let response = match cli.command {
        Command::Create { file } => Some(client.create_profile(&read_payload(&file)?).await?),
        Command::Update { id, file } => {
            Some(client.update_profile(&id, &read_payload(&file)?).await?)
        }
        Command::Delete { id } => {
            client.delete_profile(&id).await?;
            tracing::info!(profile_id = %id, "profile deleted");
            None
        }
        Command::Assign { id, file } => {
            Some(client.modify_assignments(&id, &read_payload(&file)?).await?)
        }
    };
    Ok(response)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(Some(response)) => match serde_json::to_string_pretty(&response) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
