//! Fuzz target for hostile CBOR payloads
//!
//! # Strategy
//!
//! - Deeply nested: arrays/maps nested to arbitrary depth, alone or as a
//!   history item
//! - Huge lengths: CBOR claiming massive byte/string/array lengths
//! - Random bytes under a chosen (possibly unassigned) opcode
//! - Mixed history: arrays whose items are bytes, text, integers, maps
//!
//! # Invariants
//!
//! - Decoding finishes and never panics
//! - Huge claimed lengths are rejected, not allocated
//! - A decoded history batch has exactly one envelope per array item

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use murmur_proto::{Frame, FrameHeader, Opcode, Payload};

#[derive(Debug, Clone, Arbitrary)]
enum CborAttack {
    DeeplyNested { depth: u8, payload_type: PayloadType },
    HugeLength { claimed_len_exponent: u8 },
    RandomBytes { opcode: u16, bytes: Vec<u8> },
    MixedHistory { items: Vec<HistoryItem> },
}

#[derive(Debug, Clone, Arbitrary)]
enum PayloadType {
    Array,
    Map,
    Bytes,
    String,
}

#[derive(Debug, Clone, Arbitrary)]
enum HistoryItem {
    Bytes(Vec<u8>),
    Text(String),
    Small(u8),
    EmptyMap,
}

fuzz_target!(|attack: CborAttack| {
    match attack {
        CborAttack::DeeplyNested { depth, payload_type } => {
            let nested = create_nested_cbor((depth % 50) as usize, &payload_type);

            let mut as_item = vec![0x81];
            as_item.extend_from_slice(&nested);

            for bytes in [nested, as_item] {
                for opcode in Opcode::ALL {
                    let frame = Frame::new(FrameHeader::new(opcode), bytes.clone());
                    let _ = Payload::from_frame(&frame);
                }
            }
        }

        CborAttack::HugeLength { claimed_len_exponent } => {
            let exponent = (claimed_len_exponent % 21) as u32;
            let claimed_length = if exponent < 20 { 1u32 << exponent } else { u32::MAX };

            let attacks = [
                create_huge_byte_string(claimed_length),
                create_huge_text_string(claimed_length),
                create_huge_array(claimed_length),
            ];

            for cbor_bytes in attacks {
                for opcode in [Opcode::Message, Opcode::GetCommand, Opcode::History, Opcode::Error] {
                    let frame = Frame::new(FrameHeader::new(opcode), cbor_bytes.clone());
                    let _ = Payload::from_frame(&frame);
                }
            }
        }

        CborAttack::RandomBytes { opcode, bytes } => {
            let opcode = Opcode::from_u16(opcode).unwrap_or(Opcode::History);
            let frame = Frame::new(FrameHeader::new(opcode), bytes);
            let _ = Payload::from_frame(&frame);
        }

        CborAttack::MixedHistory { items } => {
            let bytes = encode_history(&items);
            let frame = Frame::new(FrameHeader::new(Opcode::History), bytes);

            match Payload::from_frame(&frame) {
                Ok(Payload::History(history)) => assert_eq!(history.len(), items.len()),
                other => panic!("well-formed history array rejected: {other:?}"),
            }
        }
    }
});

fn encode_history(items: &[HistoryItem]) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_head(&mut bytes, 0x80, items.len());

    for item in items {
        match item {
            HistoryItem::Bytes(data) => {
                write_head(&mut bytes, 0x40, data.len());
                bytes.extend_from_slice(data);
            }
            HistoryItem::Text(text) => {
                write_head(&mut bytes, 0x60, text.len());
                bytes.extend_from_slice(text.as_bytes());
            }
            HistoryItem::Small(value) => write_head(&mut bytes, 0x00, *value as usize),
            HistoryItem::EmptyMap => bytes.push(0xA0),
        }
    }

    bytes
}

/// CBOR major type with a length argument.
fn write_head(bytes: &mut Vec<u8>, major: u8, len: usize) {
    match len {
        0..=23 => bytes.push(major | len as u8),
        24..=0xFF => bytes.extend_from_slice(&[major | 24, len as u8]),
        0x100..=0xFFFF => {
            bytes.push(major | 25);
            bytes.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ => {
            bytes.push(major | 26);
            bytes.extend_from_slice(&(len as u32).to_be_bytes());
        }
    }
}

fn create_nested_cbor(depth: usize, payload_type: &PayloadType) -> Vec<u8> {
    let mut bytes = Vec::new();

    match payload_type {
        PayloadType::Array => {
            for _ in 0..depth {
                bytes.push(0x81);
            }
            bytes.push(0x01);
        }
        PayloadType::Map => {
            for _ in 0..depth {
                bytes.push(0xA1);
                bytes.push(0x61);
                bytes.push(b'a');
            }
            bytes.push(0x01);
        }
        PayloadType::Bytes => {
            for _ in 0..depth {
                bytes.push(0x81);
            }
            bytes.push(0x41);
            bytes.push(0x00);
        }
        PayloadType::String => {
            for _ in 0..depth {
                bytes.push(0x81);
            }
            bytes.push(0x61);
            bytes.push(b'x');
        }
    }

    bytes
}

fn create_huge_byte_string(claimed_length: u32) -> Vec<u8> {
    let mut bytes = vec![0x5A];
    bytes.extend_from_slice(&claimed_length.to_be_bytes());
    bytes.extend(vec![0xAA; (claimed_length as usize).min(10)]);
    bytes
}

fn create_huge_text_string(claimed_length: u32) -> Vec<u8> {
    let mut bytes = vec![0x7A];
    bytes.extend_from_slice(&claimed_length.to_be_bytes());
    bytes.extend(vec![b'x'; (claimed_length as usize).min(10)]);
    bytes
}

fn create_huge_array(claimed_length: u32) -> Vec<u8> {
    let mut bytes = vec![0x9A];
    bytes.extend_from_slice(&claimed_length.to_be_bytes());
    for _ in 0..(claimed_length as usize).min(5) {
        bytes.push(0x01);
    }
    bytes
}
