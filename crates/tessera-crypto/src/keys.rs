//! Typed key material.
//!
//! Public, private, shared and master keys are all 32-byte values, but each
//! role is its own type so one can never be passed where another is expected.
//!
//! ## Security Notes
//!
//! - `Debug` and `Display` print a type tag and a per-instance token, never bytes
//! - Secret roles are zeroized on drop and do not implement `Clone`
//! - Equality is constant-time over the key bytes
//! - Raw secret bytes are only reachable through `expose_secret`

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of every key role in bytes.
pub const KEY_SIZE: usize = 32;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Tokens identify a key instance in logs. They carry no information about
/// the key bytes.
fn next_token() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

fn to_array(bytes: &[u8]) -> Result<[u8; KEY_SIZE]> {
    if bytes.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; KEY_SIZE];
    arr.copy_from_slice(bytes);
    Ok(arr)
}

macro_rules! key_role {
    ($name:ident) => {
        impl $name {
            pub(crate) fn new(bytes: [u8; KEY_SIZE]) -> Self {
                Self {
                    bytes,
                    token: next_token(),
                }
            }

            /// Create from raw bytes.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not exactly 32 bytes.
            pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
                Ok(Self::new(to_array(bytes)?))
            }

            /// The instance token shown by `Debug` and `Display`.
            pub fn token(&self) -> u64 {
                self.token
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.bytes.ct_eq(&other.bytes).into()
            }
        }

        impl Eq for $name {}

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.token)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

macro_rules! secret_key_role {
    ($name:ident) => {
        key_role!($name);

        impl $name {
            /// Get the raw key bytes.
            ///
            /// # Security
            ///
            /// Handle with care - this exposes secret key material.
            pub fn expose_secret(&self) -> &[u8; KEY_SIZE] {
                &self.bytes
            }
        }
    };
}

/// A public key. Safe to share, print as base64, and use as a map key.
pub struct PublicKey {
    bytes: [u8; KEY_SIZE],
    token: u64,
}

key_role!(PublicKey);

impl PublicKey {
    /// Get the key as bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Convert to byte array.
    pub fn to_bytes(&self) -> [u8; KEY_SIZE] {
        self.bytes
    }

    /// Encode as standard padded base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }

    /// Decode from standard padded base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not base64 or does not decode to 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
        Self::from_bytes(&decoded)
    }
}

// A clone is a new instance and gets its own token.
impl Clone for PublicKey {
    fn clone(&self) -> Self {
        Self::new(self.bytes)
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

/// A private key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    bytes: [u8; KEY_SIZE],
    token: u64,
}

secret_key_role!(PrivateKey);

impl PrivateKey {
    /// Decode from standard padded base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not base64 or does not decode to 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Encode as standard padded base64.
    ///
    /// # Security
    ///
    /// The returned string contains the private key.
    pub fn expose_secret_base64(&self) -> String {
        STANDARD.encode(self.bytes)
    }
}

// SECURITY: Clone intentionally NOT implemented for the secret roles.

/// The result of key agreement between one party's private key and another's
/// public key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedKey {
    bytes: [u8; KEY_SIZE],
    token: u64,
}

secret_key_role!(SharedKey);

/// A one-time symmetric key that encrypts a single payload body.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
    token: u64,
}

secret_key_role!(MasterKey);

impl MasterKey {
    /// Reinterpret a freshly created single key as a master key.
    pub fn from_shared(key: SharedKey) -> Self {
        Self::new(key.bytes)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::SharedKey {}
    impl Sealed for super::MasterKey {}
}

/// A symmetric key accepted by the precomputed seal/open operations.
///
/// Implemented by [`SharedKey`] and [`MasterKey`] only.
pub trait PrecomputedKey: sealed::Sealed + fmt::Debug {
    /// Get the raw key bytes.
    fn expose_secret(&self) -> &[u8; KEY_SIZE];
}

impl PrecomputedKey for SharedKey {
    fn expose_secret(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl PrecomputedKey for MasterKey {
    fn expose_secret(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

/// A public key together with its private key.
///
/// The two halves are expected to be related; that is established by whoever
/// generated them and is not checked here.
#[derive(Debug)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Pair a public key with its private key.
    pub fn new(public: PublicKey, private: PrivateKey) -> Self {
        Self { public, private }
    }

    /// The public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Split into the two halves.
    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public, self.private)
    }
}
