//! Fuzz target for PayloadEncoder::decode.
//!
//! Tests that decoding arbitrary wire bytes is handled safely.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_enclave::{EncodedPayloadWithRecipients, PayloadEncoder};

fuzz_target!(|data: &[u8]| {
    let encoder = PayloadEncoder::new();

    // Should succeed for valid format, fail otherwise - never panic
    if let Ok(payload) = encoder.decode(data) {
        let keys = payload.recipient_keys().len();
        assert!(keys == 0 || keys == payload.payload().recipient_boxes().len());

        // A decoded payload re-encodes to the same bytes, except that an
        // explicit zero-length key section is dropped.
        let bytes = encoder.encode(&payload).unwrap();
        assert!(data.starts_with(&bytes));

        let roundtrip = EncodedPayloadWithRecipients::from_bytes(&bytes).unwrap();
        assert_eq!(roundtrip, payload);

        for key in payload.recipient_keys() {
            let projected = payload.project_for(key).unwrap();
            assert_eq!(projected.payload().recipient_boxes().len(), 1);
            assert!(projected.recipient_keys().is_empty());
        }
    }
});
