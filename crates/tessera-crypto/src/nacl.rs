//! NaCl `crypto_box` encryptor.
//!
//! Curve25519 key agreement with XSalsa20-Poly1305, matching libsodium's
//! `crypto_box_beforenm` / `crypto_box_afternm` construction:
//! the shared key is HSalsa20 applied to the raw X25519 output.
//!
//! A message sealed directly with [`Encryptor::seal`] can be opened with the
//! precomputed shared key for the same two parties, and the other way round.

use crypto_box::SalsaBox;
use salsa20::cipher::consts::U10;
use x25519_dalek::StaticSecret;
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::XSalsa20Poly1305;
use zeroize::Zeroize;

use crate::encryptor::{Encryptor, EncryptorType};
use crate::keys::{PrecomputedKey, PrivateKey, PublicKey, SharedKey, KEY_SIZE};
use crate::nonce::Nonce;
use crate::{CryptoError, Result};

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encryptor backed by Curve25519 + XSalsa20-Poly1305.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaclEncryptor;

impl NaclEncryptor {
    /// Create the encryptor.
    pub fn new() -> Self {
        Self
    }

    fn salsa_box(public_key: &PublicKey, private_key: &PrivateKey) -> SalsaBox {
        let public = crypto_box::PublicKey::from(public_key.to_bytes());
        let secret = crypto_box::SecretKey::from(*private_key.expose_secret());
        SalsaBox::new(&public, &secret)
    }
}

impl Encryptor for NaclEncryptor {
    fn encryptor_type(&self) -> EncryptorType {
        EncryptorType::Nacl
    }

    fn compute_shared_key(
        &self,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<SharedKey> {
        let secret = StaticSecret::from(*private_key.expose_secret());
        let peer = x25519_dalek::PublicKey::from(public_key.to_bytes());
        let raw = secret.diffie_hellman(&peer);

        let mut derived = salsa20::hsalsa::<U10>(
            salsa20::Key::from_slice(raw.as_bytes()),
            &Default::default(),
        );
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&derived);
        derived.as_mut_slice().zeroize();

        Ok(SharedKey::new(bytes))
    }

    fn seal(
        &self,
        message: &[u8],
        nonce: &Nonce,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>> {
        Self::salsa_box(public_key, private_key)
            .encrypt(xsalsa20poly1305::Nonce::from_slice(nonce.as_bytes()), message)
            .map_err(|_| CryptoError::Encryption("crypto_box seal failed".into()))
    }

    fn open(
        &self,
        cipher_text: &[u8],
        nonce: &Nonce,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>> {
        Self::salsa_box(public_key, private_key)
            .decrypt(xsalsa20poly1305::Nonce::from_slice(nonce.as_bytes()), cipher_text)
            .map_err(|_| CryptoError::Decryption)
    }

    fn seal_after_precomputation(
        &self,
        message: &[u8],
        nonce: &Nonce,
        key: &dyn PrecomputedKey,
    ) -> Result<Vec<u8>> {
        let cipher = XSalsa20Poly1305::new(key.expose_secret().into());
        cipher
            .encrypt(xsalsa20poly1305::Nonce::from_slice(nonce.as_bytes()), message)
            .map_err(|_| CryptoError::Encryption("XSalsa20-Poly1305 seal failed".into()))
    }

    fn open_after_precomputation(
        &self,
        cipher_text: &[u8],
        nonce: &Nonce,
        key: &dyn PrecomputedKey,
    ) -> Result<Vec<u8>> {
        let cipher = XSalsa20Poly1305::new(key.expose_secret().into());
        cipher
            .decrypt(xsalsa20poly1305::Nonce::from_slice(nonce.as_bytes()), cipher_text)
            .map_err(|_| CryptoError::Decryption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let nacl = NaclEncryptor::new();
        let alice = nacl.generate_new_keys();
        let bob = nacl.generate_new_keys();
        let nonce = nacl.random_nonce();

        let sealed = nacl
            .seal(b"Hello, Tessera!", &nonce, bob.public_key(), alice.private_key())
            .unwrap();
        let opened = nacl
            .open(&sealed, &nonce, alice.public_key(), bob.private_key())
            .unwrap();

        assert_eq!(opened, b"Hello, Tessera!");
        assert_eq!(sealed.len(), b"Hello, Tessera!".len() + TAG_SIZE);
    }

    #[test]
    fn test_direct_seal_opens_with_precomputed_key() {
        let nacl = NaclEncryptor::new();
        let alice = nacl.generate_new_keys();
        let bob = nacl.generate_new_keys();
        let nonce = nacl.random_nonce();

        let sealed = nacl
            .seal(b"interop", &nonce, bob.public_key(), alice.private_key())
            .unwrap();
        let shared = nacl
            .compute_shared_key(alice.public_key(), bob.private_key())
            .unwrap();
        let opened = nacl.open_after_precomputation(&sealed, &nonce, &shared).unwrap();

        assert_eq!(opened, b"interop");
    }

    #[test]
    fn test_precomputed_seal_opens_directly() {
        let nacl = NaclEncryptor::new();
        let alice = nacl.generate_new_keys();
        let bob = nacl.generate_new_keys();
        let nonce = nacl.random_nonce();

        let shared = nacl
            .compute_shared_key(bob.public_key(), alice.private_key())
            .unwrap();
        let sealed = nacl.seal_after_precomputation(b"interop", &nonce, &shared).unwrap();
        let opened = nacl
            .open(&sealed, &nonce, alice.public_key(), bob.private_key())
            .unwrap();

        assert_eq!(opened, b"interop");
    }

    #[test]
    fn test_open_fails_with_wrong_key() {
        let nacl = NaclEncryptor::new();
        let alice = nacl.generate_new_keys();
        let bob = nacl.generate_new_keys();
        let eve = nacl.generate_new_keys();
        let nonce = nacl.random_nonce();

        let sealed = nacl
            .seal(b"secret", &nonce, bob.public_key(), alice.private_key())
            .unwrap();
        let result = nacl.open(&sealed, &nonce, alice.public_key(), eve.private_key());

        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_open_fails_with_wrong_nonce() {
        let nacl = NaclEncryptor::new();
        let key = nacl.create_master_key();

        let sealed = nacl
            .seal_after_precomputation(b"secret", &nacl.random_nonce(), &key)
            .unwrap();
        let result = nacl.open_after_precomputation(&sealed, &nacl.random_nonce(), &key);

        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_open_fails_with_tampered_ciphertext() {
        let nacl = NaclEncryptor::new();
        let key = nacl.create_master_key();
        let nonce = nacl.random_nonce();

        let mut sealed = nacl.seal_after_precomputation(b"secret", &nonce, &key).unwrap();
        sealed[0] ^= 0x01;
        let result = nacl.open_after_precomputation(&sealed, &nonce, &key);

        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn test_empty_message() {
        let nacl = NaclEncryptor::new();
        let key = nacl.create_master_key();
        let nonce = nacl.random_nonce();

        let sealed = nacl.seal_after_precomputation(b"", &nonce, &key).unwrap();
        assert_eq!(sealed.len(), TAG_SIZE);
        assert!(nacl
            .open_after_precomputation(&sealed, &nonce, &key)
            .unwrap()
            .is_empty());
    }
}
