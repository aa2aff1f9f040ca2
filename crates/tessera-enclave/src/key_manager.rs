//! Local key inventory.
//!
//! A [`KeyManager`] owns this node's key pairs and its forwarding keys. It
//! only ever resolves local keys; a counterparty's key is never "found".

use std::collections::HashSet;

use tessera_crypto::{KeyPair, PrivateKey, PublicKey};
use tracing::debug;

use crate::error::{EnclaveError, Result};

/// Lookup over the node's own keys.
///
/// The key set is fixed at construction and read-only afterwards.
pub trait KeyManager: Send + Sync {
    /// Find the public key that belongs to a local private key.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::KeyNotFound`] if the private key is not local.
    fn public_key_for_private_key(&self, private_key: &PrivateKey) -> Result<&PublicKey>;

    /// Find the private key that belongs to a local public key.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::KeyNotFound`] if the public key is not local.
    fn private_key_for_public_key(&self, public_key: &PublicKey) -> Result<&PrivateKey>;

    /// All local public keys.
    fn public_keys(&self) -> HashSet<PublicKey>;

    /// The key used when a caller does not name a sender.
    fn default_public_key(&self) -> &PublicKey;

    /// Keys that must be able to read every payload this node originates.
    fn forwarding_keys(&self) -> HashSet<PublicKey>;

    /// Whether `public_key` is one of this node's own keys.
    fn is_local(&self, public_key: &PublicKey) -> bool {
        self.public_keys().contains(public_key)
    }
}

/// In-memory [`KeyManager`] built from already validated key pairs.
///
/// The first key pair is the default key.
#[derive(Debug)]
pub struct LocalKeyManager {
    key_pairs: Vec<KeyPair>,
    forwarding_keys: HashSet<PublicKey>,
}

impl LocalKeyManager {
    /// Create a key manager.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::NoLocalKeys`] if `key_pairs` is empty and
    /// [`EnclaveError::DuplicateKey`] if two pairs share a public key.
    pub fn new(
        key_pairs: Vec<KeyPair>,
        forwarding_keys: impl IntoIterator<Item = PublicKey>,
    ) -> Result<Self> {
        if key_pairs.is_empty() {
            return Err(EnclaveError::NoLocalKeys);
        }

        let mut seen = HashSet::with_capacity(key_pairs.len());
        for pair in &key_pairs {
            if !seen.insert(pair.public_key()) {
                return Err(EnclaveError::DuplicateKey(pair.public_key().to_base64()));
            }
        }

        let forwarding_keys: HashSet<PublicKey> = forwarding_keys.into_iter().collect();

        debug!(
            local_keys = key_pairs.len(),
            forwarding_keys = forwarding_keys.len(),
            "Initialized local key manager"
        );

        Ok(Self {
            key_pairs,
            forwarding_keys,
        })
    }

    /// Local key pairs, default first.
    pub fn key_pairs(&self) -> &[KeyPair] {
        &self.key_pairs
    }
}

impl KeyManager for LocalKeyManager {
    fn public_key_for_private_key(&self, private_key: &PrivateKey) -> Result<&PublicKey> {
        debug!(key = %private_key, "Looking up public key for private key");

        let public = self
            .key_pairs
            .iter()
            .find(|pair| pair.private_key() == private_key)
            .map(KeyPair::public_key)
            .ok_or_else(|| EnclaveError::KeyNotFound(private_key.to_string()))?;

        debug!(key = %public, "Found public key");
        Ok(public)
    }

    fn private_key_for_public_key(&self, public_key: &PublicKey) -> Result<&PrivateKey> {
        debug!(key = %public_key, "Looking up private key for public key");

        let private = self
            .key_pairs
            .iter()
            .find(|pair| pair.public_key() == public_key)
            .map(KeyPair::private_key)
            .ok_or_else(|| EnclaveError::KeyNotFound(public_key.to_base64()))?;

        debug!(key = %public_key, "Found private key");
        Ok(private)
    }

    fn public_keys(&self) -> HashSet<PublicKey> {
        self.key_pairs
            .iter()
            .map(|pair| pair.public_key().clone())
            .collect()
    }

    fn default_public_key(&self) -> &PublicKey {
        // Construction guarantees at least one pair.
        self.key_pairs[0].public_key()
    }

    fn forwarding_keys(&self) -> HashSet<PublicKey> {
        self.forwarding_keys.clone()
    }

    fn is_local(&self, public_key: &PublicKey) -> bool {
        self.key_pairs
            .iter()
            .any(|pair| pair.public_key() == public_key)
    }
}
