//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while framing or decoding protocol data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than a frame header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Header does not start with the protocol magic.
    #[error("invalid magic number")]
    InvalidMagic,

    /// Header carries a version this build does not speak.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Payload exceeds the protocol limit.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Claimed or actual payload size
        size: usize,
        /// Protocol maximum
        max: usize,
    },

    /// Fewer payload bytes than the header claims.
    #[error("frame truncated: expected {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload size claimed by the header
        expected: usize,
        /// Payload bytes actually present
        actual: usize,
    },

    /// Opcode is not assigned.
    #[error("unknown opcode: {0:#06x}")]
    UnknownOpcode(u16),

    /// CBOR serialization failed.
    #[error("CBOR encode failed: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed.
    #[error("CBOR decode failed: {0}")]
    CborDecode(String),

    /// Payload decoded but has the wrong CBOR type for its opcode.
    #[error("invalid payload for {opcode:?}: expected {expected}, found {found}")]
    InvalidPayload {
        /// Opcode the payload arrived under
        opcode: crate::Opcode,
        /// Expected CBOR type
        expected: &'static str,
        /// CBOR type actually found
        found: &'static str,
    },

    /// History payload is not a sequence of envelopes.
    #[error("history payload is not a sequence (found {found})")]
    NotASequence {
        /// CBOR type actually found
        found: &'static str,
    },
}

impl ProtocolError {
    /// Returns true if the frame itself was structurally broken, as opposed to
    /// carrying a well-framed but unexpected payload.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. }
                | Self::InvalidMagic
                | Self::UnsupportedVersion(_)
                | Self::PayloadTooLarge { .. }
                | Self::FrameTruncated { .. }
        )
    }
}
