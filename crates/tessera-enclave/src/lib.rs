//! # tessera-enclave
//!
//! Multi-recipient sealed payloads for the Tessera privacy engine.
//!
//! This crate provides:
//! - **Enclave**: seal a message once for many recipients, open it on any of them,
//!   and seal a stored payload for a recipient added later
//! - **KeyManager**: the node's own key pairs and forwarding keys
//! - **PayloadEncoder**: the length-prefixed binary wire format, written with bincode
//! - **EnclaveConfig**: TOML configuration for all of the above
//!
//! ## Privacy Design
//!
//! - The message body is encrypted once under a one-time master key
//! - Each recipient box seals only the master key, under a pairwise shared key
//! - Recipient key lists stay on the sending node; payloads are projected to a
//!   single box before they are handed to a counterparty
//! - Keys print as a type tag and instance token, never as bytes
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tessera_crypto::EncryptorType;
//! use tessera_enclave::{Enclave, LocalKeyManager, PayloadEncoder};
//!
//! let encryptor = EncryptorType::Nacl.create();
//! let sender = encryptor.generate_new_keys();
//! let recipient = encryptor.generate_new_keys();
//! let sender_key = sender.public_key().clone();
//! let recipient_key = recipient.public_key().clone();
//!
//! let sending = Enclave::new(encryptor.clone(), Arc::new(LocalKeyManager::new(vec![sender], [])?));
//! let receiving = Enclave::new(encryptor, Arc::new(LocalKeyManager::new(vec![recipient], [])?));
//!
//! let payload = sending.encrypt_payload(b"hello", &sender_key, &[recipient_key.clone()])?;
//! let wire = PayloadEncoder::new().encode(&sending.add_recipient_to_payload(&payload, &recipient_key)?)?;
//!
//! let received = PayloadEncoder::new().decode(&wire)?;
//! assert_eq!(receiving.unencrypt_transaction(&received, &sender_key)?, b"hello");
//! # Ok::<(), tessera_enclave::EnclaveError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod enclave;
pub mod encoder;
pub mod error;
pub mod key_manager;
pub mod limits;
pub mod payload;

#[cfg(test)]
mod proptests;

pub use config::{ConfigError, EnclaveConfig, EnclaveConfigBuilder, KeyPairConfig};
pub use enclave::Enclave;
pub use encoder::PayloadEncoder;
pub use error::{EnclaveError, Result};
pub use key_manager::{KeyManager, LocalKeyManager};
pub use payload::{EncodedPayload, EncodedPayloadWithRecipients, RawTransaction};
