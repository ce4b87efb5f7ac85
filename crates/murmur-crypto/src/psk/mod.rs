//! Envelope sealing under a pre-shared secret.
//!
//! A sealed box is self-describing: it carries the version byte, the salt the
//! key was derived with, and the nonce. Opening needs only the secret.
//!
//! ```text
//! [version:1][salt:16][nonce:24][ciphertext + tag:16]
//! ```

pub mod derivation;
pub mod error;
pub mod sealing;

pub use derivation::{SALT_SIZE, SealingKey, derive_sealing_key};
pub use error::SealError;
pub use sealing::{NONCE_SIZE, SEALED_OVERHEAD, open, seal};
