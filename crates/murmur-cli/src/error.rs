//! Error types for the terminal frontend.

use std::io;

use murmur_client::{IdentityError, transport::TransportError};
use thiserror::Error;

/// Terminal frontend errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The identity could not be established.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The outbound frame channel is closed.
    #[error("channel send error")]
    ChannelSend,

    /// No platform config directory to keep the name store in.
    #[error("no config directory; pass --state-file")]
    NoConfigDir,
}
