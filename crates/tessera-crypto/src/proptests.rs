//! Property-based tests for cryptographic primitives.
//!
//! These tests use proptest to verify properties hold for arbitrary inputs
//! across every encryptor:
//!
//! - Roundtrip properties (seal/open, bytes/base64)
//! - Agreement properties (shared keys match from both sides)
//! - Tamper detection (any flipped bit is rejected)
//! - Error handling properties (invalid lengths are rejected)

use proptest::prelude::*;

use crate::{Encryptor, EncryptorType, Nonce, PublicKey, SharedKey, KEY_SIZE, NONCE_SIZE};

fn encryptor_type() -> impl Strategy<Value = EncryptorType> {
    prop_oneof![Just(EncryptorType::Nacl), Just(EncryptorType::XChaCha20)]
}

// ==================== Seal/Open Property Tests ====================

proptest! {
    /// Sealing then opening with the precomputed key returns the original message.
    #[test]
    fn precomputed_roundtrip(kind in encryptor_type(), message: Vec<u8>) {
        let enc = kind.create();
        let key = enc.create_master_key();
        let nonce = enc.random_nonce();

        let sealed = enc.seal_after_precomputation(&message, &nonce, &key).unwrap();
        let opened = enc.open_after_precomputation(&sealed, &nonce, &key).unwrap();
        prop_assert_eq!(message, opened);
    }

    /// A direct seal by A for B opens with B's private key and A's public key.
    #[test]
    fn direct_roundtrip(kind in encryptor_type(), message in prop::collection::vec(any::<u8>(), 0..512)) {
        let enc = kind.create();
        let alice = enc.generate_new_keys();
        let bob = enc.generate_new_keys();
        let nonce = enc.random_nonce();

        let sealed = enc.seal(&message, &nonce, bob.public_key(), alice.private_key()).unwrap();
        let opened = enc.open(&sealed, &nonce, alice.public_key(), bob.private_key()).unwrap();
        prop_assert_eq!(message, opened);
    }

    /// Both parties derive the same shared key.
    #[test]
    fn shared_key_symmetric(kind in encryptor_type()) {
        let enc = kind.create();
        let alice = enc.generate_new_keys();
        let bob = enc.generate_new_keys();

        let ab = enc.compute_shared_key(bob.public_key(), alice.private_key()).unwrap();
        let ba = enc.compute_shared_key(alice.public_key(), bob.private_key()).unwrap();
        prop_assert_eq!(ab, ba);
    }

    /// Different peers produce different shared keys.
    #[test]
    fn different_peers_different_keys(kind in encryptor_type()) {
        let enc = kind.create();
        let alice = enc.generate_new_keys();
        let bob = enc.generate_new_keys();
        let carol = enc.generate_new_keys();

        let ab = enc.compute_shared_key(bob.public_key(), alice.private_key()).unwrap();
        let ac = enc.compute_shared_key(carol.public_key(), alice.private_key()).unwrap();
        prop_assert_ne!(ab, ac);
    }

    /// Flipping any bit of the ciphertext makes opening fail.
    #[test]
    fn tampered_ciphertext_fails(
        kind in encryptor_type(),
        message in prop::collection::vec(any::<u8>(), 1..100),
        tamper_index in any::<usize>(),
        bit in 0u8..8
    ) {
        let enc = kind.create();
        let key = enc.create_master_key();
        let nonce = enc.random_nonce();
        let mut sealed = enc.seal_after_precomputation(&message, &nonce, &key).unwrap();

        let idx = tamper_index % sealed.len();
        sealed[idx] ^= 1 << bit;

        prop_assert!(enc.open_after_precomputation(&sealed, &nonce, &key).is_err());
    }

    /// Flipping any bit of the nonce makes opening fail.
    #[test]
    fn tampered_nonce_fails(
        kind in encryptor_type(),
        message in prop::collection::vec(any::<u8>(), 0..100),
        tamper_index in 0usize..NONCE_SIZE,
        bit in 0u8..8
    ) {
        let enc = kind.create();
        let key = enc.create_master_key();
        let nonce = enc.random_nonce();
        let sealed = enc.seal_after_precomputation(&message, &nonce, &key).unwrap();

        let mut bytes = nonce.to_bytes();
        bytes[tamper_index] ^= 1 << bit;
        let tampered = Nonce::from_bytes(&bytes).unwrap();

        prop_assert!(enc.open_after_precomputation(&sealed, &tampered, &key).is_err());
    }
}

// ==================== Key Encoding Property Tests ====================

proptest! {
    /// Public key base64 roundtrip.
    #[test]
    fn public_key_base64_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let key = PublicKey::from_bytes(&bytes).unwrap();
        let restored = PublicKey::from_base64(&key.to_base64()).unwrap();
        prop_assert_eq!(restored.as_bytes(), &bytes);
    }

    /// Invalid key length should fail for every role.
    #[test]
    fn key_invalid_length(bytes in prop::collection::vec(any::<u8>(), 0..100)) {
        prop_assume!(bytes.len() != KEY_SIZE);

        prop_assert!(PublicKey::from_bytes(&bytes).is_err());
        prop_assert!(SharedKey::from_bytes(&bytes).is_err());
    }

    /// Invalid nonce length should fail.
    #[test]
    fn nonce_invalid_length(bytes in prop::collection::vec(any::<u8>(), 0..100)) {
        prop_assume!(bytes.len() != NONCE_SIZE);
        prop_assert!(Nonce::from_bytes(&bytes).is_err());
    }

    /// Key debug output never contains the base64 form of the key.
    #[test]
    fn debug_never_prints_key(bytes in prop::array::uniform32(any::<u8>())) {
        let key = PublicKey::from_bytes(&bytes).unwrap();
        let debug = format!("{:?}", key);
        prop_assert!(!debug.contains(&key.to_base64()));
        prop_assert!(debug.starts_with("PublicKey#"));
    }
}

// ==================== Key Uniqueness Property Tests ====================

proptest! {
    /// Generated key pairs should be unique (with overwhelming probability).
    #[test]
    fn generated_keys_unique(kind in encryptor_type()) {
        let enc = kind.create();
        let k1 = enc.generate_new_keys();
        let k2 = enc.generate_new_keys();
        prop_assert_ne!(k1.public_key(), k2.public_key());
    }

    /// Generated nonces should be unique (with overwhelming probability).
    #[test]
    fn nonces_unique(kind in encryptor_type()) {
        let enc = kind.create();
        prop_assert_ne!(enc.random_nonce(), enc.random_nonce());
    }
}
