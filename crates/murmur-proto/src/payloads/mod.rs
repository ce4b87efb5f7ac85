//! CBOR-encoded protocol events.
//!
//! The frame header carries the opcode; the payload carries only the event's
//! content with no variant tag. Bare events (`NewUser`, `HistoryCleared`)
//! have an empty payload.
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one opcode (enforced by match
//! exhaustiveness). Decoding what was encoded yields the same value.

pub mod chat;
pub mod history;

use ciborium::Value;
use serde::{Deserialize, Serialize};

use self::{chat::Envelope, history::HistoryPayload};
use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Presence announcement.
    NewUser,
    /// Encrypted chat message.
    Message(Envelope),
    /// Command lookup token (trigger character already stripped).
    GetCommand(String),
    /// Stored envelopes replayed at join.
    History(HistoryPayload),
    /// Server wiped its stored history.
    HistoryCleared,
    /// Server error report.
    Error(ErrorPayload),
}

/// Error payload for error frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error code identifying the type of error.
    pub code: u16,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorPayload {
    /// Frame was rejected by the server.
    pub const FRAME_REJECTED: u16 = 0x0001;

    /// Create a frame rejection error.
    pub fn frame_rejected(reason: impl Into<String>) -> Self {
        Self { code: Self::FRAME_REJECTED, message: reason.into() }
    }
}

impl Payload {
    /// Opcode corresponding to this payload type.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::NewUser => Opcode::NewUser,
            Self::Message(_) => Opcode::Message,
            Self::GetCommand(_) => Opcode::GetCommand,
            Self::History(_) => Opcode::History,
            Self::HistoryCleared => Opcode::HistoryCleared,
            Self::Error(_) => Opcode::Error,
        }
    }

    /// Serialize the payload body (without header).
    pub fn encode(&self) -> Result<Vec<u8>> {
        let value = match self {
            Self::NewUser | Self::HistoryCleared => return Ok(Vec::new()),
            Self::Message(envelope) => Value::Bytes(envelope.as_bytes().to_vec()),
            Self::GetCommand(token) => Value::Text(token.clone()),
            Self::History(history) => history.to_value(),
            Self::Error(err) => {
                Value::serialized(err).map_err(|e| ProtocolError::CborEncode(e.to_string()))?
            },
        };

        let mut buf = Vec::new();
        ciborium::into_writer(&value, &mut buf)
            .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
        Ok(buf)
    }

    /// Wrap the payload in a frame with the matching opcode.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if the encoded body exceeds
    ///   [`FrameHeader::MAX_PAYLOAD_SIZE`]
    pub fn into_frame(self) -> Result<Frame> {
        let body = self.encode()?;
        let max = FrameHeader::MAX_PAYLOAD_SIZE as usize;
        if body.len() > max {
            return Err(ProtocolError::PayloadTooLarge { size: body.len(), max });
        }
        Ok(Frame::new(FrameHeader::new(self.opcode()), body))
    }

    /// Decode a payload body for the given opcode.
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        match opcode {
            Opcode::NewUser => Ok(Self::NewUser),
            Opcode::HistoryCleared => Ok(Self::HistoryCleared),
            Opcode::Message => history::item_to_envelope(cbor_value(bytes)?).map(Self::Message),
            Opcode::GetCommand => match cbor_value(bytes)? {
                Value::Text(token) => Ok(Self::GetCommand(token)),
                other => Err(invalid(opcode, "text", &other)),
            },
            Opcode::History => HistoryPayload::from_value(cbor_value(bytes)?).map(Self::History),
            Opcode::Error => cbor_value(bytes)?
                .deserialized()
                .map(Self::Error)
                .map_err(|e| ProtocolError::CborDecode(e.to_string())),
        }
    }

    /// Decode the payload carried by a frame.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame
            .header
            .opcode_enum()
            .ok_or(ProtocolError::UnknownOpcode(frame.header.opcode()))?;
        Self::decode(opcode, &frame.payload)
    }
}

fn cbor_value(bytes: &[u8]) -> Result<Value> {
    ciborium::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

fn invalid(opcode: Opcode, expected: &'static str, found: &Value) -> ProtocolError {
    ProtocolError::InvalidPayload { opcode, expected, found: history::value_kind(found) }
}
