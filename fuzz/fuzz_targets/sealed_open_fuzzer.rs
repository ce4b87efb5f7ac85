//! Fuzz target for murmur_crypto::open
//!
//! Arbitrary sealed boxes and secrets must be rejected without panicking,
//! and a box sealed with fuzzer-chosen salt and nonce must open again with
//! the same secret.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use murmur_crypto::{NONCE_SIZE, SALT_SIZE, open, seal};

#[derive(Debug, Arbitrary)]
enum Input {
    Garbage { sealed: Vec<u8>, secret: Vec<u8> },
    RoundTrip {
        plaintext: Vec<u8>,
        secret: Vec<u8>,
        salt: [u8; SALT_SIZE],
        nonce: [u8; NONCE_SIZE],
        flip: Option<(u16, u8)>,
    },
}

fuzz_target!(|input: Input| {
    match input {
        Input::Garbage { sealed, secret } => {
            let _ = open(&sealed, &secret);
        }

        Input::RoundTrip { plaintext, secret, salt, nonce, flip } => {
            let mut sealed = seal(&plaintext, &secret, salt, nonce);
            assert_eq!(open(&sealed, &secret).unwrap(), plaintext);

            if let Some((position, mask)) = flip {
                if mask != 0 {
                    let index = position as usize % sealed.len();
                    sealed[index] ^= mask;
                    assert!(open(&sealed, &secret).is_err());
                }
            }
        }
    }
});
