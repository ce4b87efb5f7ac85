//! Terminal frontend for murmur.
//!
//! A thin shell over [`murmur_client::Runtime`]: stdin prompts for the
//! identity, a JSON file for the saved display name, and a line-based
//! [`TerminalDriver`] bridging stdin/stdout and the QUIC transport. All
//! orchestration lives in the client crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod error;
pub mod store;
pub mod terminal;

use std::path::PathBuf;

pub use command::parse_line;
pub use error::CliError;
use murmur_client::{
    HistoryGate, IdentityStore, MessagePipeline, PskGateway, Runtime, SessionBootstrap,
    SessionConfig, Shutdown, SystemEnv, transport,
};
pub use store::JsonNameStore;
pub use terminal::{TerminalDriver, TerminalPrompter};
use tokio::io::BufReader;

/// Acquire an identity on the terminal, connect, and run the session.
///
/// # Errors
///
/// Fails if the identity cannot be established, the server cannot be
/// reached, or terminal I/O breaks mid-session.
pub async fn run(
    server: &str,
    state_file: PathBuf,
    config: SessionConfig,
) -> Result<Shutdown, CliError> {
    let mut identities = IdentityStore::new(JsonNameStore::new(state_file));
    let mut prompter = TerminalPrompter::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    let session = SessionBootstrap::acquire(&mut identities, &mut prompter, config).await?;
    tracing::info!(name = %session.identity().name(), "identity ready");

    let client = transport::connect(server).await?;

    let env = SystemEnv::new();
    let pipeline = MessagePipeline::new(session, PskGateway::new(env.clone()), HistoryGate::new());
    let driver = prompter.into_driver(client);

    Runtime::new(driver, pipeline, identities, env).run().await
}
