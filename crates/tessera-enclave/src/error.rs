//! Error types for enclave operations.

use thiserror::Error;

use tessera_crypto::CryptoError;

/// Errors that can occur while sealing, opening or decoding payloads.
#[derive(Error, Debug)]
pub enum EnclaveError {
    /// Cryptographic operation failed.
    ///
    /// A decryption failure is an authentication failure: the ciphertext,
    /// nonce or key do not match. Retrying with the same inputs is pointless.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A key lookup asked for a key this node does not own.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A projection asked for a recipient that is not part of the payload.
    #[error("Invalid recipient: {0} is not a recipient of this payload")]
    InvalidRecipient(String),

    /// A payload must be sealed for at least one recipient.
    #[error("No recipients given")]
    NoRecipients,

    /// Recipient keys and recipient boxes are not index-aligned.
    #[error("Recipient mismatch: {keys} recipient keys for {boxes} recipient boxes")]
    RecipientMismatch {
        /// Number of recipient keys.
        keys: usize,
        /// Number of recipient boxes.
        boxes: usize,
    },

    /// No recipient box is addressed to any usable local key.
    #[error("Payload has no recipient box for this node")]
    MissingRecipientBox,

    /// A projected payload holds more than one box and none can be selected.
    #[error("Payload has {boxes} recipient boxes and no recipient keys to choose between them")]
    AmbiguousRecipientBox {
        /// Number of recipient boxes.
        boxes: usize,
    },

    /// A key manager needs at least one local key pair.
    #[error("No local key pairs configured")]
    NoLocalKeys,

    /// Two local key pairs share a public key.
    #[error("Duplicate local key: {0}")]
    DuplicateKey(String),

    /// Wire data could not be decoded.
    #[error("Malformed payload: {field}: {reason}")]
    Malformed {
        /// Field being read when decoding failed.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl EnclaveError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for enclave operations.
pub type Result<T> = std::result::Result<T, EnclaveError>;
