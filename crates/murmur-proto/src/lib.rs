//! Murmur wire protocol
//!
//! Framing and payload types for the murmur chat transport. Every event that
//! crosses the duplex connection is a [`Frame`]: a fixed 12-byte binary
//! [`FrameHeader`] followed by a CBOR payload whose type is selected by the
//! header's [`Opcode`].
//!
//! ```text
//! ┌──────────────────────── FrameHeader (12 bytes) ───────────────────────┐
//! │ magic "MRMR" (4) │ version (1) │ flags (1) │ opcode (2) │ size (4)     │
//! └───────────────────────────────────────────────────────────────────────┘
//! [ payload: `size` bytes of CBOR ]
//! ```
//!
//! Message contents never appear in clear on the wire. The client seals a
//! [`PlaintextMessage`] into an opaque [`Envelope`] before emitting it, and the
//! server only ever stores and replays envelopes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod header;
mod opcode;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcode::Opcode;
pub use payloads::{
    Payload,
    chat::{Envelope, PlaintextMessage},
    history::HistoryPayload,
};
