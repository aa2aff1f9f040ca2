//! Sealed payload data model.
//!
//! An [`EncodedPayload`] carries one ciphertext of the message body and one
//! recipient box per recipient, each box holding the payload's master key
//! sealed for that recipient. [`EncodedPayloadWithRecipients`] adds the
//! sender-side list of recipient keys, index-aligned with the boxes.
//!
//! ## Privacy Design
//!
//! The recipient key list must never leave the sending node. A payload handed
//! to a counterparty is first projected with
//! [`EncodedPayloadWithRecipients::project_for`], which keeps only that
//! counterparty's box and drops the key list entirely.
//!
//! `Debug` on every type here prints sizes and counts, never contents.

use std::fmt;

use tessera_crypto::{Nonce, PublicKey};

use crate::error::{EnclaveError, Result};

/// A payload sealed for one or more recipients.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    sender_key: PublicKey,
    cipher_text: Vec<u8>,
    cipher_text_nonce: Nonce,
    recipient_boxes: Vec<Vec<u8>>,
    recipient_nonce: Nonce,
}

impl EncodedPayload {
    /// Assemble a payload from its parts.
    pub fn new(
        sender_key: PublicKey,
        cipher_text: Vec<u8>,
        cipher_text_nonce: Nonce,
        recipient_boxes: Vec<Vec<u8>>,
        recipient_nonce: Nonce,
    ) -> Self {
        Self {
            sender_key,
            cipher_text,
            cipher_text_nonce,
            recipient_boxes,
            recipient_nonce,
        }
    }

    /// The originator's public key.
    pub fn sender_key(&self) -> &PublicKey {
        &self.sender_key
    }

    /// The message body, sealed once under the master key.
    pub fn cipher_text(&self) -> &[u8] {
        &self.cipher_text
    }

    /// Nonce used for the message body.
    pub fn cipher_text_nonce(&self) -> &Nonce {
        &self.cipher_text_nonce
    }

    /// The master key sealed once per recipient.
    pub fn recipient_boxes(&self) -> &[Vec<u8>] {
        &self.recipient_boxes
    }

    /// Nonce shared by every recipient box of this payload.
    pub fn recipient_nonce(&self) -> &Nonce {
        &self.recipient_nonce
    }
}

impl fmt::Debug for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedPayload")
            .field("sender_key", &self.sender_key)
            .field("cipher_text_len", &self.cipher_text.len())
            .field("recipient_boxes", &self.recipient_boxes.len())
            .finish_non_exhaustive()
    }
}

/// An [`EncodedPayload`] plus the keys of the recipients it was sealed for.
///
/// `recipient_keys` is either empty (a received or projected payload) or
/// exactly as long as the payload's recipient boxes, with `recipient_keys[i]`
/// owning `recipient_boxes[i]`.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPayloadWithRecipients {
    payload: EncodedPayload,
    recipient_keys: Vec<PublicKey>,
}

impl EncodedPayloadWithRecipients {
    /// Pair a payload with its recipient keys.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::RecipientMismatch`] if `recipient_keys` is
    /// non-empty and not the same length as the payload's recipient boxes.
    pub fn new(payload: EncodedPayload, recipient_keys: Vec<PublicKey>) -> Result<Self> {
        let boxes = payload.recipient_boxes.len();
        if !recipient_keys.is_empty() && recipient_keys.len() != boxes {
            return Err(EnclaveError::RecipientMismatch {
                keys: recipient_keys.len(),
                boxes,
            });
        }
        Ok(Self {
            payload,
            recipient_keys,
        })
    }

    /// Wrap a payload that carries no recipient keys.
    pub fn without_recipients(payload: EncodedPayload) -> Self {
        Self {
            payload,
            recipient_keys: Vec::new(),
        }
    }

    /// The sealed payload.
    pub fn payload(&self) -> &EncodedPayload {
        &self.payload
    }

    /// The recipient keys, index-aligned with the recipient boxes.
    pub fn recipient_keys(&self) -> &[PublicKey] {
        &self.recipient_keys
    }

    /// Split into payload and recipient keys.
    pub fn into_parts(self) -> (EncodedPayload, Vec<PublicKey>) {
        (self.payload, self.recipient_keys)
    }

    /// Index of `recipient` in the recipient key list.
    pub fn recipient_index(&self, recipient: &PublicKey) -> Option<usize> {
        self.recipient_keys.iter().position(|key| key == recipient)
    }

    /// Append `recipient` and its box, keeping keys and boxes aligned.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::RecipientMismatch`] if the payload already
    /// holds boxes without recipient keys.
    pub fn with_recipient(&self, recipient: PublicKey, recipient_box: Vec<u8>) -> Result<Self> {
        let mut payload = self.payload.clone();
        payload.recipient_boxes.push(recipient_box);
        let mut recipient_keys = self.recipient_keys.clone();
        recipient_keys.push(recipient);
        Self::new(payload, recipient_keys)
    }

    /// Project the payload for a single recipient.
    ///
    /// The result holds only `recipient`'s box and no recipient keys, so it
    /// can be handed to that recipient without revealing who else received
    /// the message.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::InvalidRecipient`] if `recipient` is not in
    /// the recipient key list.
    pub fn project_for(&self, recipient: &PublicKey) -> Result<Self> {
        let index = self
            .recipient_index(recipient)
            .ok_or_else(|| EnclaveError::InvalidRecipient(recipient.to_base64()))?;
        let recipient_box = self
            .payload
            .recipient_boxes
            .get(index)
            .cloned()
            .ok_or(EnclaveError::MissingRecipientBox)?;

        let payload = EncodedPayload {
            recipient_boxes: vec![recipient_box],
            ..self.payload.clone()
        };

        tracing::trace!(recipient = %recipient, index, "Projected payload for recipient");

        Ok(Self::without_recipients(payload))
    }
}

impl fmt::Debug for EncodedPayloadWithRecipients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedPayloadWithRecipients")
            .field("payload", &self.payload)
            .field("recipient_keys", &self.recipient_keys.len())
            .finish()
    }
}

/// A payload sealed for its sender only, to be re-keyed for recipients later.
///
/// `encrypted_key` holds the master key sealed under the sender's own
/// shared key with the same `nonce` as the body.
#[derive(Clone, PartialEq, Eq)]
pub struct RawTransaction {
    encrypted_payload: Vec<u8>,
    encrypted_key: Vec<u8>,
    nonce: Nonce,
    from: PublicKey,
}

impl RawTransaction {
    /// Assemble a raw transaction from its parts.
    pub fn new(
        encrypted_payload: Vec<u8>,
        encrypted_key: Vec<u8>,
        nonce: Nonce,
        from: PublicKey,
    ) -> Self {
        Self {
            encrypted_payload,
            encrypted_key,
            nonce,
            from,
        }
    }

    /// The message body, sealed under the master key.
    pub fn encrypted_payload(&self) -> &[u8] {
        &self.encrypted_payload
    }

    /// The master key, sealed for the sender.
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }

    /// Nonce used for both the body and the sealed key.
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// The sender's public key.
    pub fn from(&self) -> &PublicKey {
        &self.from
    }
}

impl fmt::Debug for RawTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTransaction")
            .field("from", &self.from)
            .field("encrypted_payload_len", &self.encrypted_payload.len())
            .field("encrypted_key_len", &self.encrypted_key.len())
            .finish_non_exhaustive()
    }
}
