//! Fuzz target for Payload::from_frame
//!
//! The same bytes are decoded under every opcode, covering:
//! - Malformed CBOR
//! - Type confusion (a history array under `message`, a string under
//!   `history`, and so on)
//! - History items of unexpected types
//!
//! Decoding must never panic.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use murmur_proto::{Frame, FrameHeader, Opcode, Payload};

fuzz_target!(|data: &[u8]| {
    for opcode in Opcode::ALL {
        let frame = Frame::new(FrameHeader::new(opcode), Bytes::copy_from_slice(data));

        if let Ok(Payload::History(history)) = Payload::from_frame(&frame) {
            // Decoded batches must survive a second trip
            let again = Payload::History(history.clone()).into_frame().unwrap();
            assert_eq!(Payload::from_frame(&again).unwrap(), Payload::History(history));
        }
    }
});
