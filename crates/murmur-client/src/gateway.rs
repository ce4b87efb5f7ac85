//! Encrypt/decrypt boundary keyed by the shared secret.
//!
//! The pipeline only sees [`CryptoGateway`]. [`PskGateway`] is the shipped
//! implementation: CBOR plaintext sealed with `murmur-crypto`, salt and nonce
//! drawn from the [`Environment`].

use std::future::Future;

use murmur_crypto::{NONCE_SIZE, SALT_SIZE};
use murmur_proto::{Envelope, PlaintextMessage};

use crate::{env::Environment, error::CryptoFailure, identity::SharedSecret};

/// Seals plaintext into envelopes and opens them again.
///
/// Implementations hold no per-session state; the secret is supplied on every
/// call. Neither operation retries.
pub trait CryptoGateway: Send + Sync {
    /// Seal a message under the secret.
    fn encrypt(
        &self,
        secret: &SharedSecret,
        plaintext: &PlaintextMessage,
    ) -> impl Future<Output = Result<Envelope, CryptoFailure>> + Send;

    /// Open an envelope with the secret.
    fn decrypt(
        &self,
        secret: &SharedSecret,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<PlaintextMessage, CryptoFailure>> + Send;
}

/// Passphrase gateway: HKDF-SHA256 key per envelope, XChaCha20-Poly1305.
#[derive(Clone)]
pub struct PskGateway<E> {
    env: E,
}

impl<E: Environment> PskGateway<E> {
    /// Create a gateway drawing randomness from `env`.
    pub fn new(env: E) -> Self {
        Self { env }
    }

    fn seal(
        &self,
        secret: &SharedSecret,
        plaintext: &PlaintextMessage,
    ) -> Result<Envelope, CryptoFailure> {
        let encoded = plaintext.to_cbor()?;

        let mut salt = [0u8; SALT_SIZE];
        let mut nonce = [0u8; NONCE_SIZE];
        self.env.random_bytes(&mut salt);
        self.env.random_bytes(&mut nonce);

        Ok(Envelope::from(murmur_crypto::seal(&encoded, secret.as_bytes(), salt, nonce)))
    }

    fn open(
        &self,
        secret: &SharedSecret,
        envelope: &Envelope,
    ) -> Result<PlaintextMessage, CryptoFailure> {
        let encoded = murmur_crypto::open(envelope.as_bytes(), secret.as_bytes())?;
        Ok(PlaintextMessage::from_cbor(&encoded)?)
    }
}

impl<E: Environment> CryptoGateway for PskGateway<E> {
    fn encrypt(
        &self,
        secret: &SharedSecret,
        plaintext: &PlaintextMessage,
    ) -> impl Future<Output = Result<Envelope, CryptoFailure>> + Send {
        std::future::ready(self.seal(secret, plaintext))
    }

    fn decrypt(
        &self,
        secret: &SharedSecret,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<PlaintextMessage, CryptoFailure>> + Send {
        std::future::ready(self.open(secret, envelope))
    }
}
