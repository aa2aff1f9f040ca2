//! X25519 + XChaCha20-Poly1305 encryptor.
//!
//! The shared key is derived from the raw X25519 output with BLAKE3's key
//! derivation mode, then used as an XChaCha20-Poly1305 key. Direct seal/open
//! are the precomputed operations applied to that derived key.
//!
//! ## Security Notes
//!
//! - Derived keys are zeroized on drop
//! - 192-bit nonces are safe to generate at random
//! - NEVER reuse a nonce with the same key

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use x25519_dalek::StaticSecret;

use crate::encryptor::{Encryptor, EncryptorType};
use crate::keys::{PrecomputedKey, PrivateKey, PublicKey, SharedKey};
use crate::nonce::Nonce;
use crate::{CryptoError, Result};

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Domain separation context for shared key derivation.
const SHARED_KEY_CONTEXT: &str = "Tessera X25519 XChaCha20-Poly1305 shared key v1";

/// Encryptor backed by X25519 + XChaCha20-Poly1305.
#[derive(Debug, Default, Clone, Copy)]
pub struct XChaChaEncryptor;

impl XChaChaEncryptor {
    /// Create the encryptor.
    pub fn new() -> Self {
        Self
    }
}

impl Encryptor for XChaChaEncryptor {
    fn encryptor_type(&self) -> EncryptorType {
        EncryptorType::XChaCha20
    }

    fn compute_shared_key(
        &self,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<SharedKey> {
        let secret = StaticSecret::from(*private_key.expose_secret());
        let peer = x25519_dalek::PublicKey::from(public_key.to_bytes());
        let raw = secret.diffie_hellman(&peer);

        Ok(SharedKey::new(blake3::derive_key(
            SHARED_KEY_CONTEXT,
            raw.as_bytes(),
        )))
    }

    fn seal(
        &self,
        message: &[u8],
        nonce: &Nonce,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>> {
        let shared = self.compute_shared_key(public_key, private_key)?;
        self.seal_after_precomputation(message, nonce, &shared)
    }

    fn open(
        &self,
        cipher_text: &[u8],
        nonce: &Nonce,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>> {
        let shared = self.compute_shared_key(public_key, private_key)?;
        self.open_after_precomputation(cipher_text, nonce, &shared)
    }

    fn seal_after_precomputation(
        &self,
        message: &[u8],
        nonce: &Nonce,
        key: &dyn PrecomputedKey,
    ) -> Result<Vec<u8>> {
        let cipher = XChaCha20Poly1305::new(key.expose_secret().into());
        let xnonce = XNonce::from_slice(nonce.as_bytes());

        cipher
            .encrypt(xnonce, message)
            .map_err(|_| CryptoError::Encryption("XChaCha20-Poly1305 encryption failed".into()))
    }

    fn open_after_precomputation(
        &self,
        cipher_text: &[u8],
        nonce: &Nonce,
        key: &dyn PrecomputedKey,
    ) -> Result<Vec<u8>> {
        let cipher = XChaCha20Poly1305::new(key.expose_secret().into());
        let xnonce = XNonce::from_slice(nonce.as_bytes());

        cipher
            .decrypt(xnonce, cipher_text)
            .map_err(|_| CryptoError::Decryption)
    }
}
