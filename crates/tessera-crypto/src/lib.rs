//! # tessera-crypto
//!
//! Cryptographic primitives for the Tessera privacy engine.
//!
//! This crate provides:
//! - **Typed keys**: distinct public, private, shared and master key types
//! - **Nonce**: 192-bit single-use nonces
//! - **Encryptor**: the box-style seal/open contract the engine depends on
//! - **NaCl** (Curve25519 + XSalsa20-Poly1305) and **XChaCha20-Poly1305**
//!   implementations, selected through [`EncryptorType`]
//!
//! ## Security
//!
//! All secret key material uses `zeroize` for memory cleanup.
//! Key comparisons are constant-time via `subtle`.
//! No key type prints its bytes through `Debug` or `Display`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encryptor;
pub mod error;
pub mod keys;
pub mod nacl;
pub mod nonce;
pub mod xchacha;

#[cfg(test)]
mod proptests;

pub use encryptor::{Encryptor, EncryptorType};
pub use error::{CryptoError, Result};
pub use keys::{KeyPair, MasterKey, PrecomputedKey, PrivateKey, PublicKey, SharedKey, KEY_SIZE};
pub use nacl::NaclEncryptor;
pub use nonce::{Nonce, NONCE_SIZE};
pub use xchacha::XChaChaEncryptor;
