//! Fuzz target for opening ciphertexts with a precomputed key.
//!
//! Arbitrary ciphertexts must be rejected without panicking, for every
//! encryptor.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_crypto::{EncryptorType, Nonce, SharedKey, KEY_SIZE, NONCE_SIZE};

fuzz_target!(|data: &[u8]| {
    if data.len() < KEY_SIZE + NONCE_SIZE {
        return;
    }

    let key = SharedKey::from_bytes(&data[..KEY_SIZE]).unwrap();
    let nonce = Nonce::from_bytes(&data[KEY_SIZE..KEY_SIZE + NONCE_SIZE]).unwrap();
    let cipher_text = &data[KEY_SIZE + NONCE_SIZE..];

    for kind in EncryptorType::ALL {
        let encryptor = kind.create();
        // Forging a valid tag is infeasible; any success would be a bug.
        assert!(encryptor
            .open_after_precomputation(cipher_text, &nonce, &key)
            .is_err());
    }
});
