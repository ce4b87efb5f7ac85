//! Murmur Cryptographic Primitives
//!
//! Shared-secret sealing for chat envelopes. Pure functions with deterministic
//! outputs: callers provide the random salt and nonce bytes, which keeps
//! sealing reproducible under test.
//!
//! # Key Lifecycle
//!
//! Every envelope is sealed under a fresh key derived from the room's shared
//! secret and a per-envelope random salt. The derived key is used for exactly
//! one seal or open and is zeroized when dropped.
//!
//! ```text
//! Shared secret ──┐
//!                 ├─ HKDF-SHA256 ("murmurPskV1") → Sealing Key (per envelope)
//! Random salt ────┘                                    │
//!                                                      ▼
//!                                   XChaCha20-Poly1305 → Sealed box
//! ```
//!
//! # Security
//!
//! Confidentiality and integrity rest entirely on the shared secret. There is
//! no sender authentication: anyone holding the secret can seal and open.
//! A failed authentication tag means either the wrong secret or tampering, and
//! the two are deliberately indistinguishable.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod psk;

pub use psk::{
    NONCE_SIZE, SALT_SIZE, SEALED_OVERHEAD, SealError, SealingKey, derive_sealing_key, open,
    seal,
};
