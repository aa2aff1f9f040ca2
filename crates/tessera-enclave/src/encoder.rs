//! Binary wire codec for sealed payloads.
//!
//! ## Wire Format
//!
//! Every field is an 8-byte unsigned big-endian length followed by that many
//! bytes. Lists are an 8-byte count followed by one length-prefixed field
//! per element.
//!
//! ```text
//! sender_key | cipher_text | cipher_text_nonce
//!   | box_count   (len, box)*
//!   | recipient_nonce
//!   [ | key_count (len, key)* ]
//! ```
//!
//! The trailing recipient-key section is written only when the payload has
//! recipient keys. A decoder that reaches the end of input after the
//! recipient nonce reads an empty key list, so the same decoder handles
//! both local payloads and projected network payloads.
//!
//! Both sections are written with bincode using big-endian fixed-width
//! integers, which gives exactly the layout above: a byte vector is a `u64`
//! length and its bytes, a list of vectors is a `u64` count and its entries.
//! Decoding reads at most [`MAX_PAYLOAD_SIZE`] bytes and then checks every
//! field and list against the protocol limits. Truncated or oversized input
//! is reported as [`EnclaveError::Malformed`] and never panics.

use bincode::Options;
use serde::{Deserialize, Serialize};
use tessera_crypto::{Nonce, PublicKey};

use crate::error::{EnclaveError, Result};
use crate::limits::{MAX_FIELD_SIZE, MAX_PAYLOAD_SIZE, MAX_RECIPIENTS};
use crate::payload::{EncodedPayload, EncodedPayloadWithRecipients};

/// Mandatory section, borrowed from a payload for writing.
#[derive(Serialize)]
struct SectionRef<'a> {
    sender_key: &'a [u8],
    cipher_text: &'a [u8],
    cipher_text_nonce: &'a [u8],
    recipient_boxes: &'a [Vec<u8>],
    recipient_nonce: &'a [u8],
}

/// Mandatory section as read from the wire, before validation.
#[derive(Deserialize)]
struct Section {
    sender_key: Vec<u8>,
    cipher_text: Vec<u8>,
    cipher_text_nonce: Vec<u8>,
    recipient_boxes: Vec<Vec<u8>>,
    recipient_nonce: Vec<u8>,
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

/// Encodes and decodes [`EncodedPayloadWithRecipients`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadEncoder;

impl PayloadEncoder {
    /// Create an encoder.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a payload to its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::Serialization`] if bincode fails to write a
    /// section.
    pub fn encode(&self, payload: &EncodedPayloadWithRecipients) -> Result<Vec<u8>> {
        let inner = payload.payload();
        let section = SectionRef {
            sender_key: &inner.sender_key().as_bytes()[..],
            cipher_text: inner.cipher_text(),
            cipher_text_nonce: &inner.cipher_text_nonce().as_bytes()[..],
            recipient_boxes: inner.recipient_boxes(),
            recipient_nonce: &inner.recipient_nonce().as_bytes()[..],
        };

        let mut out = wire_options()
            .serialize(&section)
            .map_err(|e| EnclaveError::Serialization(e.to_string()))?;

        if !payload.recipient_keys().is_empty() {
            let keys: Vec<&[u8]> = payload
                .recipient_keys()
                .iter()
                .map(|key| &key.as_bytes()[..])
                .collect();
            wire_options()
                .serialize_into(&mut out, &keys)
                .map_err(|e| EnclaveError::Serialization(e.to_string()))?;
        }

        tracing::trace!(len = out.len(), "Encoded payload");
        Ok(out)
    }

    /// Parse a payload from its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::Malformed`] for truncated input, input larger
    /// than [`MAX_PAYLOAD_SIZE`], fields or lists over the protocol limits,
    /// keys or nonces of the wrong size, and trailing bytes. Returns
    /// [`EnclaveError::RecipientMismatch`] if a recipient key section is
    /// present and not aligned with the boxes.
    pub fn decode(&self, bytes: &[u8]) -> Result<EncodedPayloadWithRecipients> {
        let mut reader = bytes;

        let section: Section = wire_options()
            .with_limit(MAX_PAYLOAD_SIZE as u64)
            .deserialize_from(&mut reader)
            .map_err(|e| EnclaveError::malformed("payload", e.to_string()))?;

        let recipient_keys: Vec<Vec<u8>> = if reader.is_empty() {
            Vec::new()
        } else {
            let budget = MAX_PAYLOAD_SIZE.saturating_sub(bytes.len() - reader.len());
            wire_options()
                .with_limit(budget as u64)
                .deserialize_from(&mut reader)
                .map_err(|e| EnclaveError::malformed("recipient_keys", e.to_string()))?
        };

        if !reader.is_empty() {
            return Err(EnclaveError::malformed(
                "payload",
                format!("{} trailing bytes", reader.len()),
            ));
        }

        let sender_key = public_key(&section.sender_key, "sender_key")?;
        let cipher_text = checked_field(section.cipher_text, "cipher_text")?;
        let cipher_text_nonce = nonce(&section.cipher_text_nonce, "cipher_text_nonce")?;
        let recipient_boxes = checked_list(section.recipient_boxes, "recipient_boxes")?;
        let recipient_nonce = nonce(&section.recipient_nonce, "recipient_nonce")?;
        let recipient_keys = checked_list(recipient_keys, "recipient_keys")?
            .iter()
            .map(|bytes| public_key(bytes, "recipient_keys"))
            .collect::<Result<Vec<_>>>()?;

        let payload = EncodedPayload::new(
            sender_key,
            cipher_text,
            cipher_text_nonce,
            recipient_boxes,
            recipient_nonce,
        );
        EncodedPayloadWithRecipients::new(payload, recipient_keys)
    }

    /// Project a payload for `recipient` before retransmission.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::InvalidRecipient`] if `recipient` is not one
    /// of the payload's recipient keys.
    pub fn for_recipient(
        &self,
        payload: &EncodedPayloadWithRecipients,
        recipient: &PublicKey,
    ) -> Result<EncodedPayloadWithRecipients> {
        payload.project_for(recipient)
    }
}

impl EncodedPayloadWithRecipients {
    /// Serialize to the wire form. See [`PayloadEncoder::encode`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PayloadEncoder.encode(self)
    }

    /// Parse from the wire form. See [`PayloadEncoder::decode`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        PayloadEncoder.decode(bytes)
    }
}

fn checked_field(bytes: Vec<u8>, field: &'static str) -> Result<Vec<u8>> {
    if bytes.len() > MAX_FIELD_SIZE {
        return Err(EnclaveError::malformed(
            field,
            format!("length {} exceeds maximum {}", bytes.len(), MAX_FIELD_SIZE),
        ));
    }
    Ok(bytes)
}

fn checked_list(items: Vec<Vec<u8>>, field: &'static str) -> Result<Vec<Vec<u8>>> {
    if items.len() > MAX_RECIPIENTS {
        return Err(EnclaveError::malformed(
            field,
            format!("count {} exceeds maximum {}", items.len(), MAX_RECIPIENTS),
        ));
    }
    items
        .into_iter()
        .map(|item| checked_field(item, field))
        .collect()
}

fn public_key(bytes: &[u8], field: &'static str) -> Result<PublicKey> {
    PublicKey::from_bytes(bytes).map_err(|e| EnclaveError::malformed(field, e.to_string()))
}

fn nonce(bytes: &[u8], field: &'static str) -> Result<Nonce> {
    Nonce::from_bytes(bytes).map_err(|e| EnclaveError::malformed(field, e.to_string()))
}
