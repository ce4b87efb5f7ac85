//! Sealing errors.

use thiserror::Error;

/// Errors from opening a sealed box.
///
/// Sealing itself cannot fail for valid inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SealError {
    /// Input is shorter than the fixed sealed-box overhead.
    #[error("sealed box truncated: need at least {minimum} bytes, got {actual}")]
    Truncated {
        /// Minimum valid length
        minimum: usize,
        /// Actual length
        actual: usize,
    },

    /// Version byte is not one this build understands.
    #[error("unsupported sealed box version: {0}")]
    UnsupportedVersion(u8),

    /// Authentication tag did not verify (wrong secret or tampered box).
    #[error("authentication failed")]
    AuthenticationFailed,
}
