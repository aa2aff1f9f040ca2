//! Enclave configuration.
//!
//! Selects the encryptor and supplies the node's key pairs and forwarding
//! keys as base64 text, usually from a TOML file.
//!
//! # Example
//!
//! ```toml
//! encryptor = "nacl"
//! forwarding_keys = ["1mI+JkG2...="]
//!
//! [[keys]]
//! public_key = "/+UuD63z...="
//! private_key = "yAWAJjwP...="
//! ```
//!
//! ```no_run
//! use tessera_enclave::config::EnclaveConfig;
//!
//! let config = EnclaveConfig::load("tessera.toml")?;
//! let enclave = config.build_enclave()?;
//! # Ok::<(), tessera_enclave::EnclaveError>(())
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tessera_crypto::{EncryptorType, KeyPair, PrivateKey, PublicKey};

use crate::enclave::Enclave;
use crate::key_manager::LocalKeyManager;

/// Top-level enclave configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnclaveConfig {
    /// Which encryptor to use.
    pub encryptor: EncryptorType,

    /// Local key pairs. The first one is the default key.
    pub keys: Vec<KeyPairConfig>,

    /// Base64 public keys that receive every payload this node originates.
    pub forwarding_keys: Vec<String>,
}

/// A key pair as base64 text.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct KeyPairConfig {
    /// Base64 public key.
    pub public_key: String,
    /// Base64 private key.
    pub private_key: String,
}

impl KeyPairConfig {
    /// Encode a key pair.
    pub fn from_key_pair(pair: &KeyPair) -> Self {
        Self {
            public_key: pair.public_key().to_base64(),
            private_key: pair.private_key().expose_secret_base64(),
        }
    }
}

impl fmt::Debug for KeyPairConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl EnclaveConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration builder.
    pub fn builder() -> EnclaveConfigBuilder {
        EnclaveConfigBuilder::new()
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), keys = config.keys.len(), "Loaded enclave configuration");
        Ok(config)
    }

    /// Serialize to TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration.
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "keys".into(),
                reason: "at least one key pair is required".into(),
            });
        }

        self.key_pairs()?;
        self.forwarding_public_keys()?;
        Ok(())
    }

    /// Decode the configured key pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first key that does
    /// not decode.
    pub fn key_pairs(&self) -> Result<Vec<KeyPair>, ConfigError> {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, pair)| {
                let public = PublicKey::from_base64(&pair.public_key).map_err(|e| {
                    ConfigError::InvalidValue {
                        field: format!("keys[{}].public_key", i),
                        reason: e.to_string(),
                    }
                })?;
                let private = PrivateKey::from_base64(&pair.private_key).map_err(|e| {
                    ConfigError::InvalidValue {
                        field: format!("keys[{}].private_key", i),
                        reason: e.to_string(),
                    }
                })?;
                Ok(KeyPair::new(public, private))
            })
            .collect()
    }

    /// Decode the configured forwarding keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first key that does
    /// not decode.
    pub fn forwarding_public_keys(&self) -> Result<Vec<PublicKey>, ConfigError> {
        self.forwarding_keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                PublicKey::from_base64(key).map_err(|e| ConfigError::InvalidValue {
                    field: format!("forwarding_keys[{}]", i),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Validate the configuration and build an [`Enclave`] from it.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the key set is rejected by
    /// [`LocalKeyManager::new`].
    pub fn build_enclave(&self) -> crate::Result<Enclave> {
        self.validate()?;

        let key_manager = LocalKeyManager::new(self.key_pairs()?, self.forwarding_public_keys()?)?;

        tracing::info!(
            encryptor = %self.encryptor,
            local_keys = self.keys.len(),
            forwarding_keys = self.forwarding_keys.len(),
            "Enclave configured"
        );

        Ok(Enclave::new(self.encryptor.create(), Arc::new(key_manager)))
    }
}

/// Builder for [`EnclaveConfig`].
///
/// Provides a fluent interface for building configuration.
#[derive(Clone, Debug, Default)]
pub struct EnclaveConfigBuilder {
    config: EnclaveConfig,
}

impl EnclaveConfigBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: EnclaveConfig::default(),
        }
    }

    /// Build the final configuration.
    pub fn build(self) -> EnclaveConfig {
        self.config
    }

    /// Build and validate the configuration.
    ///
    /// Returns an error if validation fails.
    pub fn build_validated(self) -> Result<EnclaveConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }

    /// Select the encryptor.
    pub fn with_encryptor(mut self, encryptor: EncryptorType) -> Self {
        self.config.encryptor = encryptor;
        self
    }

    /// Add a local key pair.
    pub fn with_key_pair(mut self, pair: &KeyPair) -> Self {
        self.config.keys.push(KeyPairConfig::from_key_pair(pair));
        self
    }

    /// Add a forwarding key.
    pub fn with_forwarding_key(mut self, key: &PublicKey) -> Self {
        self.config.forwarding_keys.push(key.to_base64());
        self
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML or has the wrong shape.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The field name.
        field: String,
        /// The reason it's invalid.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnclaveError;

    fn generated_pair() -> KeyPair {
        EncryptorType::Nacl.create().generate_new_keys()
    }

    #[test]
    fn test_default_config_is_invalid() {
        let config = EnclaveConfig::default();
        assert_eq!(config.encryptor, EncryptorType::Nacl);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "keys"
        ));
    }

    #[test]
    fn test_builder() {
        let pair = generated_pair();
        let forward = generated_pair();
        let config = EnclaveConfig::builder()
            .with_encryptor(EncryptorType::XChaCha20)
            .with_key_pair(&pair)
            .with_forwarding_key(forward.public_key())
            .build_validated()
            .unwrap();

        assert_eq!(config.encryptor, EncryptorType::XChaCha20);
        assert_eq!(config.keys[0].public_key, pair.public_key().to_base64());
        assert_eq!(config.forwarding_public_keys().unwrap()[0], *forward.public_key());
    }

    #[test]
    fn test_parse_toml() {
        let pair = generated_pair();
        let text = format!(
            r#"
encryptor = "xchacha20"

[[keys]]
public_key = "{}"
private_key = "{}"
"#,
            pair.public_key().to_base64(),
            pair.private_key().expose_secret_base64()
        );

        let config = EnclaveConfig::from_toml_str(&text).unwrap();
        assert_eq!(config.encryptor, EncryptorType::XChaCha20);
        assert!(config.forwarding_keys.is_empty());

        let pairs = config.key_pairs().unwrap();
        assert_eq!(pairs[0].public_key(), pair.public_key());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EnclaveConfig::builder().with_key_pair(&generated_pair()).build();
        let text = config.to_toml_string().unwrap();
        let parsed = EnclaveConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.keys[0].private_key, config.keys[0].private_key);
    }

    #[test]
    fn test_unknown_encryptor_rejected() {
        let result = EnclaveConfig::from_toml_str("encryptor = \"rot13\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_key_names_field() {
        let mut config = EnclaveConfig::builder().with_key_pair(&generated_pair()).build();
        config.forwarding_keys.push("not base64!".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "forwarding_keys[0]"
        ));

        config.forwarding_keys.clear();
        config.keys[0].private_key = "AAAA".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "keys[0].private_key"
        ));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let pair = generated_pair();
        let config = EnclaveConfig::builder().with_key_pair(&pair).build();
        let debug = format!("{:?}", config);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&pair.private_key().expose_secret_base64()));
    }

    #[test]
    fn test_build_enclave() {
        let pair = generated_pair();
        let enclave = EnclaveConfig::builder()
            .with_key_pair(&pair)
            .build()
            .build_enclave()
            .unwrap();
        assert_eq!(enclave.default_public_key(), pair.public_key());
    }

    #[test]
    fn test_build_enclave_rejects_duplicate_keys() {
        let pair = generated_pair();
        let result = EnclaveConfig::builder()
            .with_key_pair(&pair)
            .with_key_pair(&pair)
            .build()
            .build_enclave();
        assert!(matches!(result, Err(EnclaveError::DuplicateKey(_))));
    }
}
