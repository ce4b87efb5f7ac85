//! Envelope sealing using `XChaCha20-Poly1305`
//!
//! All functions are pure - random salt and nonce bytes must be provided by
//! the caller.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};

use super::{
    derivation::{SALT_SIZE, derive_sealing_key},
    error::SealError,
};

/// Current sealed box format version
const SEALED_VERSION: u8 = 1;

/// Size of the `XChaCha20` nonce (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
const POLY1305_TAG_SIZE: usize = 16;

/// Bytes a sealed box adds on top of the plaintext.
pub const SEALED_OVERHEAD: usize = 1 + SALT_SIZE + NONCE_SIZE + POLY1305_TAG_SIZE;

/// Seal a plaintext under a shared secret.
///
/// Layout: `version || salt || nonce || ciphertext+tag`.
///
/// # Security
///
/// - A fresh key is derived from `secret` and `salt` for this box alone
/// - Caller MUST provide cryptographically secure random `salt` and `nonce`
///   in production
/// - Authenticated encryption prevents tampering
pub fn seal(
    plaintext: &[u8],
    secret: &[u8],
    salt: [u8; SALT_SIZE],
    nonce: [u8; NONCE_SIZE],
) -> Vec<u8> {
    let key = derive_sealing_key(secret, &salt);
    let cipher = XChaCha20Poly1305::new(key.key().into());

    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), plaintext) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    let mut sealed = Vec::with_capacity(1 + SALT_SIZE + NONCE_SIZE + ciphertext.len());
    sealed.push(SEALED_VERSION);
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    sealed
}

/// Open a sealed box with a shared secret.
///
/// # Errors
///
/// - `Truncated`: input shorter than [`SEALED_OVERHEAD`]
/// - `UnsupportedVersion`: unknown version byte
/// - `AuthenticationFailed`: wrong secret or tampered box
pub fn open(sealed: &[u8], secret: &[u8]) -> Result<Vec<u8>, SealError> {
    if sealed.len() < SEALED_OVERHEAD {
        return Err(SealError::Truncated { minimum: SEALED_OVERHEAD, actual: sealed.len() });
    }

    let (version, rest) = sealed.split_at(1);
    if version[0] != SEALED_VERSION {
        return Err(SealError::UnsupportedVersion(version[0]));
    }

    let (salt, rest) = rest.split_at(SALT_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let mut salt_bytes = [0u8; SALT_SIZE];
    salt_bytes.copy_from_slice(salt);

    let key = derive_sealing_key(secret, &salt_bytes);
    let cipher = XChaCha20Poly1305::new(key.key().into());

    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| SealError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_SIZE] = [0x5A; SALT_SIZE];
    const NONCE: [u8; NONCE_SIZE] = [0xA5; NONCE_SIZE];

    #[test]
    fn seal_then_open() {
        let sealed = seal(b"hello", b"s1", SALT, NONCE);
        assert_eq!(open(&sealed, b"s1").unwrap(), b"hello");
    }

    #[test]
    fn sealed_layout() {
        let sealed = seal(b"abc", b"s1", SALT, NONCE);

        assert_eq!(sealed.len(), SEALED_OVERHEAD + 3);
        assert_eq!(sealed[0], SEALED_VERSION);
        assert_eq!(&sealed[1..=SALT_SIZE], &SALT);
        assert_eq!(&sealed[1 + SALT_SIZE..1 + SALT_SIZE + NONCE_SIZE], &NONCE);
    }

    #[test]
    fn wrong_secret_fails_authentication() {
        let sealed = seal(b"hello", b"s1", SALT, NONCE);
        assert_eq!(open(&sealed, b"s2"), Err(SealError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let mut sealed = seal(b"hello", b"s1", SALT, NONCE);
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;

        assert_eq!(open(&sealed, b"s1"), Err(SealError::AuthenticationFailed));
    }

    #[test]
    fn tampered_salt_fails_authentication() {
        let mut sealed = seal(b"hello", b"s1", SALT, NONCE);
        sealed[1] ^= 0x01;

        assert_eq!(open(&sealed, b"s1"), Err(SealError::AuthenticationFailed));
    }

    #[test]
    fn short_input_is_truncated() {
        assert_eq!(
            open(&[SEALED_VERSION; 10], b"s1"),
            Err(SealError::Truncated { minimum: SEALED_OVERHEAD, actual: 10 })
        );
        assert!(matches!(open(&[], b"s1"), Err(SealError::Truncated { actual: 0, .. })));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut sealed = seal(b"hello", b"s1", SALT, NONCE);
        sealed[0] = 9;

        assert_eq!(open(&sealed, b"s1"), Err(SealError::UnsupportedVersion(9)));
    }

    #[test]
    fn empty_plaintext_seals() {
        let sealed = seal(b"", b"s1", SALT, NONCE);

        assert_eq!(sealed.len(), SEALED_OVERHEAD);
        assert!(open(&sealed, b"s1").unwrap().is_empty());
    }

    #[test]
    fn different_salts_give_different_boxes() {
        let a = seal(b"hello", b"s1", [0x00; SALT_SIZE], NONCE);
        let b = seal(b"hello", b"s1", [0x01; SALT_SIZE], NONCE);

        assert_ne!(a[1 + SALT_SIZE + NONCE_SIZE..], b[1 + SALT_SIZE + NONCE_SIZE..]);
    }
}
