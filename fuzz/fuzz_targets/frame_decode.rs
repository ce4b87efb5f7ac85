//! Fuzz target for Frame::decode
//!
//! Feeds arbitrary bytes to the frame parser looking for:
//! - Panics in header validation
//! - Overflow in payload size arithmetic
//! - Over-reads past a truncated payload
//!
//! Every invalid input must come back as an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use murmur_proto::{Frame, FrameHeader};

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = Frame::decode(data) {
        // A decoded frame re-encodes to exactly the bytes it was read from
        let mut wire = Vec::new();
        frame.encode(&mut wire).unwrap();
        assert_eq!(wire.as_slice(), &data[..FrameHeader::SIZE + frame.payload.len()]);
    }
});
