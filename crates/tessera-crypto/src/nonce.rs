//! Single-use nonces.
//!
//! Both supported encryptors use 192-bit nonces (XSalsa20 and XChaCha20),
//! which are large enough to be generated at random.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::{CryptoError, Result};

/// Size of a nonce in bytes (192 bits).
pub const NONCE_SIZE: usize = 24;

/// A 192-bit nonce.
///
/// A nonce must never be reused with the same key. The bytes are held by
/// value, so every copy handed out is independent of the original.
#[derive(Clone, PartialEq, Eq)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a nonce from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 24 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the nonce as a byte array reference.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }

    /// Copy the nonce bytes out.
    pub fn to_bytes(&self) -> [u8; NONCE_SIZE] {
        self.bytes
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_nonces_differ() {
        let a = Nonce::generate();
        let b = Nonce::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_nonce_from_bytes() {
        let bytes = [0x42u8; NONCE_SIZE];
        let nonce = Nonce::from_bytes(&bytes).unwrap();
        assert_eq!(nonce.as_bytes(), &bytes);
    }

    #[test]
    fn test_nonce_from_bytes_invalid_length() {
        let result = Nonce::from_bytes(&[0u8; 12]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: 12
            })
        ));
    }

    #[test]
    fn test_copied_bytes_are_independent() {
        let nonce = Nonce::from_bytes(&[7u8; NONCE_SIZE]).unwrap();
        let mut copy = nonce.to_bytes();
        copy[0] = 0;
        assert_eq!(nonce.as_bytes()[0], 7);
    }

    #[test]
    fn test_nonce_debug_is_truncated() {
        let nonce = Nonce::from_bytes(&[0xabu8; NONCE_SIZE]).unwrap();
        assert_eq!(format!("{:?}", nonce), "Nonce(abab..)");
    }
}
