//! murmur terminal client.
//!
//! # Usage
//!
//! ```bash
//! murmur --server 127.0.0.1:4433
//!
//! # Keep the saved username somewhere else and give the server longer to
//! # replay history
//! murmur --server 127.0.0.1:4433 --state-file ./me.json --history-timeout-ms 60000
//! ```
//!
//! In the session, `/name <new>` renames, `/secret <new>` replaces the shared
//! secret and `/quit` leaves.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use murmur_cli::{CliError, JsonNameStore};
use murmur_client::SessionConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// murmur shared-secret chat client
#[derive(Parser, Debug)]
#[command(name = "murmur")]
#[command(about = "End-to-end encrypted group chat over a shared secret")]
#[command(version)]
struct Args {
    /// Server address to connect to
    #[arg(short, long, default_value = "127.0.0.1:4433")]
    server: String,

    /// File holding the saved username (defaults to the platform config dir)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// How long to wait for history before showing the chat anyway
    #[arg(long, default_value = "30000")]
    history_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Chat goes to stdout; logs stay on stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let state_file = match args.state_file {
        Some(path) => path,
        None => JsonNameStore::default_path().ok_or(CliError::NoConfigDir)?,
    };

    let config = SessionConfig {
        history_timeout: Duration::from_millis(args.history_timeout_ms),
        ..SessionConfig::default()
    };

    let shutdown = murmur_cli::run(&args.server, state_file, config).await?;
    tracing::info!(?shutdown, "session ended");

    Ok(())
}
