//! The primitive encryption contract and encryptor selection.
//!
//! An [`Encryptor`] wraps a box-style public-key scheme: key agreement plus an
//! authenticated cipher. It knows nothing about payload structure.
//!
//! Exactly one encryptor is chosen at startup through [`EncryptorType`] and
//! handed to its consumers as an `Arc<dyn Encryptor>`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::StaticSecret;

use crate::keys::{KeyPair, MasterKey, PrecomputedKey, PrivateKey, PublicKey, SharedKey, KEY_SIZE};
use crate::nacl::NaclEncryptor;
use crate::nonce::Nonce;
use crate::xchacha::XChaChaEncryptor;
use crate::{CryptoError, Result};

/// Box-style authenticated public-key encryption.
///
/// Every `open` operation is deterministic. A failure means the ciphertext,
/// nonce or key do not match and is reported as [`CryptoError::Decryption`];
/// implementations never return partially decrypted data.
pub trait Encryptor: Send + Sync {
    /// Which scheme this is.
    fn encryptor_type(&self) -> EncryptorType;

    /// Derive the key shared by the owner of `private_key` and the owner of
    /// `public_key`.
    ///
    /// For key pairs A and B, `compute_shared_key(pub_a, priv_b)` equals
    /// `compute_shared_key(pub_b, priv_a)`.
    fn compute_shared_key(&self, public_key: &PublicKey, private_key: &PrivateKey)
        -> Result<SharedKey>;

    /// Seal `message` for the owner of `public_key`, authenticated as the owner
    /// of `private_key`.
    fn seal(
        &self,
        message: &[u8],
        nonce: &Nonce,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>>;

    /// Open a ciphertext produced by [`Encryptor::seal`].
    fn open(
        &self,
        cipher_text: &[u8],
        nonce: &Nonce,
        public_key: &PublicKey,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>>;

    /// Seal `message` under an already computed shared or master key.
    fn seal_after_precomputation(
        &self,
        message: &[u8],
        nonce: &Nonce,
        key: &dyn PrecomputedKey,
    ) -> Result<Vec<u8>>;

    /// Open a ciphertext produced by [`Encryptor::seal_after_precomputation`].
    fn open_after_precomputation(
        &self,
        cipher_text: &[u8],
        nonce: &Nonce,
        key: &dyn PrecomputedKey,
    ) -> Result<Vec<u8>>;

    /// A fresh random nonce.
    fn random_nonce(&self) -> Nonce {
        Nonce::generate()
    }

    /// Generate a new X25519 key pair.
    fn generate_new_keys(&self) -> KeyPair {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = x25519_dalek::PublicKey::from(&secret);
        KeyPair::new(
            PublicKey::new(public.to_bytes()),
            PrivateKey::new(secret.to_bytes()),
        )
    }

    /// A fresh random symmetric key.
    fn create_single_key(&self) -> SharedKey {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        SharedKey::new(bytes)
    }

    /// A fresh one-time master key.
    fn create_master_key(&self) -> MasterKey {
        MasterKey::from_shared(self.create_single_key())
    }
}

/// The available encryptor implementations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptorType {
    /// Curve25519 + XSalsa20-Poly1305, as NaCl `crypto_box`.
    #[default]
    Nacl,
    /// X25519 + BLAKE3 key derivation + XChaCha20-Poly1305.
    XChaCha20,
}

impl EncryptorType {
    /// All known encryptor types.
    pub const ALL: [EncryptorType; 2] = [EncryptorType::Nacl, EncryptorType::XChaCha20];

    /// The configuration name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nacl => "nacl",
            Self::XChaCha20 => "xchacha20",
        }
    }

    /// Create the encryptor for this type.
    pub fn create(self) -> Arc<dyn Encryptor> {
        tracing::debug!(encryptor = self.name(), "Creating encryptor");
        match self {
            Self::Nacl => Arc::new(NaclEncryptor::new()),
            Self::XChaCha20 => Arc::new(XChaChaEncryptor::new()),
        }
    }
}

impl fmt::Display for EncryptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncryptorType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CryptoError::UnknownEncryptor(s.to_string()))
    }
}
