//! Client error types.

use murmur_crypto::SealError;
use murmur_proto::ProtocolError;
use thiserror::Error;

/// Identity could not be established or changed.
///
/// At bootstrap every variant is fatal: the session cannot start and the user
/// has to begin again from scratch. At runtime the previous identity is kept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Shared secret was missing or blank.
    #[error("no password is set")]
    BlankSecret,

    /// Display name was missing or blank.
    #[error("username is required")]
    BlankName,

    /// Persisted name could not be read or written.
    #[error("name storage failed: {0}")]
    Storage(String),
}

/// A single envelope could not be sealed or opened.
///
/// Callers treat every variant the same way: a placeholder inbound, a notice
/// outbound. The variants only exist to make the logs useful.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoFailure {
    /// Sealed box rejected (wrong secret, tampering, or malformed box).
    #[error("sealed box rejected: {0}")]
    Seal(#[from] SealError),

    /// Plaintext could not be encoded before sealing or decoded after opening.
    #[error("plaintext encoding: {0}")]
    Plaintext(#[from] ProtocolError),
}
