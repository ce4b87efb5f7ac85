//! Chat message payload types.
//!
//! An [`Envelope`] is what travels on the wire. A [`PlaintextMessage`] is what
//! lives inside it once opened with the shared secret.

use bytes::Bytes;
use ciborium::Value;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ProtocolError, Result};

/// Opaque ciphertext unit exchanged over the transport.
///
/// The protocol layer never looks inside an envelope. Whatever bytes the
/// sender's crypto produced are relayed and replayed verbatim.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Envelope(Bytes);

impl Envelope {
    /// Raw sealed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the envelope carries no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Envelope {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<Bytes> for Envelope {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Envelope").field(&format_args!("{} bytes", self.0.len())).finish()
    }
}

/// Decrypted chat message.
///
/// Both fields default to empty when missing from the decoded map or when
/// they hold anything other than text (`null`, a number, a nested map), so a
/// partially-formed plaintext still decodes. Deciding what an empty field
/// means for display is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaintextMessage {
    /// Sender's display name.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub username: String,
    /// Message text.
    #[serde(default, deserialize_with = "text_or_empty")]
    pub msg: String,
}

fn text_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Text(text) => Ok(text),
        _ => Ok(String::new()),
    }
}

impl PlaintextMessage {
    /// Build a message from a sender name and text.
    pub fn new(username: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { username: username.into(), msg: msg.into() }
    }

    /// Encode to CBOR for sealing.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from CBOR after opening.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
    }
}
