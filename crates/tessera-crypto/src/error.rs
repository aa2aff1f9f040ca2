//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// A failed `open` is always reported as [`CryptoError::Decryption`] without
/// further detail. Retrying with the same inputs will fail the same way.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (invalid ciphertext, nonce or key).
    #[error("Decryption failed: invalid ciphertext, nonce or key")]
    Decryption,

    /// Invalid key length.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length.
        expected: usize,
        /// Actual key length.
        actual: usize,
    },

    /// Invalid nonce length.
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected nonce length.
        expected: usize,
        /// Actual nonce length.
        actual: usize,
    },

    /// Key text was not valid base64.
    #[error("Invalid base64 key: {0}")]
    InvalidBase64(String),

    /// Unknown encryptor name.
    #[error("Unknown encryptor type: {0}")]
    UnknownEncryptor(String),
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
