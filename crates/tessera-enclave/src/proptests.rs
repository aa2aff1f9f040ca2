//! Property-based tests for the enclave and the wire codec.
//!
//! - Seal/open roundtrips for any message and recipient count
//! - Fan-out: every recipient box unwraps the same master key
//! - Wire idempotence and index alignment through encode/decode
//! - Decoding arbitrary bytes never panics

use std::sync::Arc;

use proptest::prelude::*;
use tessera_crypto::{EncryptorType, KeyPair, Nonce, PublicKey};

use crate::{
    Enclave, EncodedPayload, EncodedPayloadWithRecipients, EnclaveError, LocalKeyManager,
    PayloadEncoder,
};

fn enclave_for(kind: EncryptorType, pairs: Vec<KeyPair>) -> Enclave {
    let manager = LocalKeyManager::new(pairs, []).unwrap();
    Enclave::new(kind.create(), Arc::new(manager))
}

fn encryptor_type() -> impl Strategy<Value = EncryptorType> {
    prop_oneof![Just(EncryptorType::Nacl), Just(EncryptorType::XChaCha20)]
}

fn public_key() -> impl Strategy<Value = PublicKey> {
    prop::array::uniform32(any::<u8>()).prop_map(|bytes| PublicKey::from_bytes(&bytes).unwrap())
}

fn distinct_public_keys(count: usize) -> impl Strategy<Value = Vec<PublicKey>> {
    prop::collection::hash_set(prop::array::uniform32(any::<u8>()), count).prop_map(|set| {
        set.into_iter()
            .map(|bytes| PublicKey::from_bytes(&bytes).unwrap())
            .collect()
    })
}

fn nonce() -> impl Strategy<Value = Nonce> {
    prop::array::uniform24(any::<u8>()).prop_map(|bytes| Nonce::from_bytes(&bytes).unwrap())
}

fn payload_with_recipients() -> impl Strategy<Value = EncodedPayloadWithRecipients> {
    (
        public_key(),
        prop::collection::vec(any::<u8>(), 0..256),
        nonce(),
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..6),
        nonce(),
        any::<bool>(),
    )
        .prop_flat_map(|(sender, cipher_text, ct_nonce, boxes, r_nonce, with_keys)| {
            let key_count = if with_keys { boxes.len() } else { 0 };
            let payload = EncodedPayload::new(sender, cipher_text, ct_nonce, boxes, r_nonce);
            distinct_public_keys(key_count).prop_map(move |keys| {
                EncodedPayloadWithRecipients::new(payload.clone(), keys).unwrap()
            })
        })
}

// ==================== Enclave Property Tests ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The sender can always re-read what it sealed.
    #[test]
    fn sender_roundtrip(
        kind in encryptor_type(),
        message in prop::collection::vec(any::<u8>(), 0..1024),
        recipients in 1usize..5
    ) {
        let encryptor = kind.create();
        let sender = encryptor.generate_new_keys();
        let sender_key = sender.public_key().clone();
        let keys: Vec<PublicKey> = (0..recipients)
            .map(|_| encryptor.generate_new_keys().public_key().clone())
            .collect();

        let enclave = enclave_for(kind, vec![sender]);
        let payload = enclave.encrypt_payload(&message, &sender_key, &keys).unwrap();

        prop_assert_eq!(payload.payload().recipient_boxes().len(), recipients);
        prop_assert_eq!(payload.recipient_keys(), &keys[..]);
        prop_assert_eq!(enclave.unencrypt_transaction(&payload, &sender_key).unwrap(), message);
    }

    /// Every recipient opens its own projection to the same plaintext.
    #[test]
    fn every_recipient_roundtrip(
        kind in encryptor_type(),
        message in prop::collection::vec(any::<u8>(), 0..256),
        recipients in 1usize..4
    ) {
        let encryptor = kind.create();
        let sender = encryptor.generate_new_keys();
        let sender_key = sender.public_key().clone();
        let recipient_pairs: Vec<KeyPair> =
            (0..recipients).map(|_| encryptor.generate_new_keys()).collect();
        let keys: Vec<PublicKey> =
            recipient_pairs.iter().map(|p| p.public_key().clone()).collect();

        let sending = enclave_for(kind, vec![sender]);
        let payload = sending.encrypt_payload(&message, &sender_key, &keys).unwrap();

        for (pair, key) in recipient_pairs.into_iter().zip(&keys) {
            let projected = sending.add_recipient_to_payload(&payload, key).unwrap();
            let wire = PayloadEncoder::new().encode(&projected).unwrap();
            let received = PayloadEncoder::new().decode(&wire).unwrap();

            let receiving = enclave_for(kind, vec![pair]);
            prop_assert_eq!(receiving.unencrypt_transaction(&received, &sender_key).unwrap(), &message[..]);
        }
    }

    /// Flipping a bit anywhere in the body or the box fails decryption.
    #[test]
    fn tampering_detected(
        kind in encryptor_type(),
        message in prop::collection::vec(any::<u8>(), 1..128),
        position in any::<usize>(),
        bit in 0u8..8,
        in_box in any::<bool>()
    ) {
        let encryptor = kind.create();
        let sender = encryptor.generate_new_keys();
        let sender_key = sender.public_key().clone();
        let recipient = encryptor.generate_new_keys();
        let recipient_key = recipient.public_key().clone();

        let sending = enclave_for(kind, vec![sender]);
        let payload = sending
            .encrypt_payload(&message, &sender_key, &[recipient_key.clone()])
            .unwrap();
        let projected = sending.add_recipient_to_payload(&payload, &recipient_key).unwrap();

        let (inner, _) = projected.into_parts();
        let mut cipher_text = inner.cipher_text().to_vec();
        let mut recipient_box = inner.recipient_boxes()[0].clone();
        let target = if in_box { &mut recipient_box } else { &mut cipher_text };
        let idx = position % target.len();
        target[idx] ^= 1 << bit;

        let tampered = EncodedPayloadWithRecipients::without_recipients(EncodedPayload::new(
            inner.sender_key().clone(),
            cipher_text,
            inner.cipher_text_nonce().clone(),
            vec![recipient_box],
            inner.recipient_nonce().clone(),
        ));

        let receiving = enclave_for(kind, vec![recipient]);
        let result = receiving.unencrypt_transaction(&tampered, &sender_key);
        prop_assert!(matches!(result, Err(EnclaveError::Crypto(_))));
    }
}

// ==================== Codec Property Tests ====================

proptest! {
    /// decode(encode(p)) == p, keys present or not.
    #[test]
    fn wire_idempotent(payload in payload_with_recipients()) {
        let encoder = PayloadEncoder::new();
        let bytes = encoder.encode(&payload).unwrap();
        let decoded = encoder.decode(&bytes).unwrap();

        prop_assert_eq!(&decoded, &payload);
        prop_assert_eq!(encoder.encode(&decoded).unwrap(), bytes);
    }

    /// Recipient keys stay aligned with their boxes through the wire.
    #[test]
    fn alignment_preserved(payload in payload_with_recipients()) {
        let decoded = EncodedPayloadWithRecipients::from_bytes(&payload.to_bytes().unwrap()).unwrap();

        for (i, key) in payload.recipient_keys().iter().enumerate() {
            let projected = decoded.project_for(key).unwrap();
            prop_assert_eq!(decoded.recipient_index(key), Some(i));
            prop_assert_eq!(
                &projected.payload().recipient_boxes()[0],
                &payload.payload().recipient_boxes()[i]
            );
        }
    }

    /// Decoding arbitrary bytes returns an error or a payload; it never panics.
    #[test]
    fn decode_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = PayloadEncoder::new().decode(&bytes);
    }

    /// Any strict prefix cut inside the mandatory section is rejected.
    #[test]
    fn truncation_rejected(payload in payload_with_recipients(), cut in any::<prop::sample::Index>()) {
        let (inner, _) = payload.into_parts();
        let bytes = EncodedPayloadWithRecipients::without_recipients(inner).to_bytes().unwrap();
        let len = cut.index(bytes.len());

        let is_malformed = matches!(
            PayloadEncoder::new().decode(&bytes[..len]),
            Err(EnclaveError::Malformed { .. })
        );
        prop_assert!(is_malformed);
    }
}

