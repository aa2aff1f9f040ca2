//! Fuzz target for PublicKey::from_base64.
//!
//! Tests that parsing arbitrary text as a public key is handled safely.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_crypto::{PublicKey, KEY_SIZE};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(key) = PublicKey::from_base64(text) {
            assert_eq!(key.as_bytes().len(), KEY_SIZE);

            let restored = PublicKey::from_base64(&key.to_base64()).unwrap();
            assert_eq!(restored, key);

            // Printing never reveals the key
            assert!(!format!("{:?}", key).contains(&key.to_base64()));
        }
    }
});
