//! History replay payload.
//!
//! The server replays its stored envelopes to a newly joined client as a
//! single CBOR array. The array is decoded dynamically so that a payload of
//! the wrong shape is reported as [`ProtocolError::NotASequence`] instead of
//! a generic decode failure, and so that an individual odd item cannot make
//! the whole batch disappear.

use ciborium::Value;

use crate::{
    Envelope,
    errors::{ProtocolError, Result},
};

/// Ordered batch of envelopes replayed at join time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryPayload {
    entries: Vec<Envelope>,
}

impl HistoryPayload {
    /// Build a batch from envelopes in delivery order.
    pub fn new(entries: Vec<Envelope>) -> Self {
        Self { entries }
    }

    /// Validate a decoded CBOR value into a batch.
    ///
    /// - `null` is an empty batch (nothing stored yet).
    /// - An array yields one envelope per item, in order. Byte strings are
    ///   taken as-is, text strings as their UTF-8 bytes. Any other item is
    ///   re-encoded to CBOR and kept as an opaque envelope, which will fail to
    ///   open downstream rather than being dropped here.
    /// - Anything else is a protocol violation.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(items) => {
                let entries = items.into_iter().map(item_to_envelope).collect::<Result<_>>()?;
                Ok(Self { entries })
            },
            other => Err(ProtocolError::NotASequence { found: value_kind(&other) }),
        }
    }

    /// Encode the batch as a CBOR array of byte strings.
    pub fn to_value(&self) -> Value {
        Value::Array(self.entries.iter().map(|e| Value::Bytes(e.as_bytes().to_vec())).collect())
    }

    /// Envelopes in delivery order.
    pub fn entries(&self) -> &[Envelope] {
        &self.entries
    }

    /// Number of envelopes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn item_to_envelope(item: Value) -> Result<Envelope> {
    match item {
        Value::Bytes(bytes) => Ok(Envelope::from(bytes)),
        Value::Text(text) => Ok(Envelope::from(text.into_bytes())),
        other => {
            let mut buf = Vec::new();
            ciborium::into_writer(&other, &mut buf)
                .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
            Ok(Envelope::from(buf))
        },
    }
}

/// Short CBOR type name for diagnostics.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "integer",
        Value::Bytes(_) => "bytes",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Tag(..) => "tag",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        _ => "unknown",
    }
}
