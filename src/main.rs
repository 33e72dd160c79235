// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitcoach command-line client
//!
//! Signs in against the coaching backend, keeps the session in the local
//! credential directory, and issues authenticated requests.

use clap::{Parser, Subcommand};
use fitcoach_client::{
    config::Config, ApiClient, CredentialStore, FileSlots, RequestDescriptor, SessionService,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "fitcoach", version, about = "Fitcoach backend client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FITCOACH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Fetch and print the signed-in user's profile
    Whoami,
    /// Force a token refresh
    Refresh,
    /// GET a backend path and print the JSON response
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let store = CredentialStore::new(FileSlots::new(&config.credentials_dir));
    let client = ApiClient::new(&config, store)?;
    client
        .register_logout_callback(|| {
            eprintln!("Session expired. Run `fitcoach login` to sign in again.");
        })
        .await;
    let session = SessionService::new(client.clone());

    tracing::debug!(
        base_url = %config.api_base_url,
        backend = client.store().backend_name(),
        "Client initialized"
    );

    match cli.command {
        Command::Login { email, password } => {
            let pair = session.login(&email, &password).await?;
            println!(
                "Signed in (user {})",
                pair.user_id().unwrap_or_else(|| "unknown".to_string())
            );
        }
        Command::Logout => {
            session.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => {
            if let Some(cached) = session.cached_profile().await {
                tracing::debug!(name = %cached.display_name(), "Cached profile");
            }
            let profile = session.refresh_profile().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Refresh => {
            if client.refresher().refresh().await {
                println!("Token refreshed");
            } else {
                return Err("Token refresh failed".into());
            }
        }
        Command::Get { path } => {
            let value = client.execute(&RequestDescriptor::get(path)).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "fitcoach_client=debug,info";

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry().with(filter).with(format).init();
}
