//! Key derivation for envelope sealing using HKDF

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

/// Label bound into every derived key
const PSK_KEY_LABEL: &[u8] = b"murmurPskV1";

/// Size of the per-envelope random salt (16 bytes)
pub const SALT_SIZE: usize = 16;

/// A key derived for sealing or opening a single envelope.
///
/// Zeroized on drop.
pub struct SealingKey {
    key: [u8; 32],
}

impl SealingKey {
    /// 32-byte symmetric key for XChaCha20-Poly1305 AEAD.
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }
}

impl Drop for SealingKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Derive the sealing key for one envelope.
///
/// The shared secret is the input keying material and the envelope's random
/// salt is the HKDF salt, so every envelope is sealed under a distinct key.
///
/// # Security
///
/// - Different salts produce unrelated keys
/// - Deterministic: same secret and salt always produce the same key
/// - The label domain-separates these keys from any other HKDF use of the
///   same secret
pub fn derive_sealing_key(secret: &[u8], salt: &[u8; SALT_SIZE]) -> SealingKey {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), secret);

    let mut key = [0u8; 32];
    let Ok(()) = hkdf.expand(PSK_KEY_LABEL, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    SealingKey { key }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let salt = [0x11; SALT_SIZE];
        let a = derive_sealing_key(b"s1", &salt);
        let b = derive_sealing_key(b"s1", &salt);

        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let a = derive_sealing_key(b"s1", &[0x00; SALT_SIZE]);
        let b = derive_sealing_key(b"s1", &[0x01; SALT_SIZE]);

        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn different_secrets_produce_different_keys() {
        let salt = [0x22; SALT_SIZE];
        let a = derive_sealing_key(b"s1", &salt);
        let b = derive_sealing_key(b"s2", &salt);

        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn key_is_not_the_raw_secret() {
        let secret = [0x42u8; 32];
        let key = derive_sealing_key(&secret, &[0x00; SALT_SIZE]);

        assert_ne!(key.key(), &secret);
    }
}
