//! Multi-recipient sealing and opening.
//!
//! A message is sealed once under a fresh master key. The master key is then
//! sealed once per recipient under the shared key between the sender and
//! that recipient, all with the same recipient nonce. Each shared key is
//! distinct, so reusing the nonce across boxes is safe.
//!
//! ```text
//! cipher_text       = seal(message,    cipher_text_nonce, master)
//! recipient_box[i]  = seal(master,     recipient_nonce,   shared(sender, recipient[i]))
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tessera_crypto::{Encryptor, MasterKey, Nonce, PrecomputedKey, PrivateKey, PublicKey};
use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::error::{EnclaveError, Result};
use crate::key_manager::KeyManager;
use crate::payload::{EncodedPayload, EncodedPayloadWithRecipients, RawTransaction};

/// The node's encryption engine.
///
/// Every operation is a pure function of its inputs and the immutable local
/// key set, so one `Enclave` can be shared freely across threads.
pub struct Enclave {
    encryptor: Arc<dyn Encryptor>,
    key_manager: Arc<dyn KeyManager>,
}

impl Enclave {
    /// Create an enclave from an encryptor and a key manager.
    pub fn new(encryptor: Arc<dyn Encryptor>, key_manager: Arc<dyn KeyManager>) -> Self {
        debug!(encryptor = %encryptor.encryptor_type(), "Creating enclave");
        Self {
            encryptor,
            key_manager,
        }
    }

    /// The encryptor in use.
    pub fn encryptor(&self) -> &Arc<dyn Encryptor> {
        &self.encryptor
    }

    /// Seal `message` from `sender` for every key in `recipients`.
    ///
    /// The body is encrypted exactly once; only the master key is sealed per
    /// recipient. The returned recipient keys are `recipients`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::NoRecipients`] if `recipients` is empty and
    /// [`EnclaveError::KeyNotFound`] if `sender` is not a local key.
    pub fn encrypt_payload(
        &self,
        message: &[u8],
        sender: &PublicKey,
        recipients: &[PublicKey],
    ) -> Result<EncodedPayloadWithRecipients> {
        if recipients.is_empty() {
            return Err(EnclaveError::NoRecipients);
        }
        debug!(
            sender = %sender,
            recipients = recipients.len(),
            message_len = message.len(),
            "Encrypting payload"
        );

        let master_key = self.encryptor.create_master_key();
        let cipher_text_nonce = self.encryptor.random_nonce();
        let recipient_nonce = self.encryptor.random_nonce();

        let cipher_text =
            self.encryptor
                .seal_after_precomputation(message, &cipher_text_nonce, &master_key)?;

        let sender_private = self.key_manager.private_key_for_public_key(sender)?;
        let recipient_boxes =
            self.seal_master_key(&master_key, sender_private, recipients, &recipient_nonce)?;

        let payload = EncodedPayload::new(
            sender.clone(),
            cipher_text,
            cipher_text_nonce,
            recipient_boxes,
            recipient_nonce,
        );
        EncodedPayloadWithRecipients::new(payload, recipients.to_vec())
    }

    /// Seal `message` for `sender` alone.
    ///
    /// The master key is kept sealed under the sender's own shared key so the
    /// transaction can be re-keyed for recipients later with
    /// [`Enclave::encrypt_raw_for_recipients`].
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::KeyNotFound`] if `sender` is not a local key.
    pub fn encrypt_raw_payload(&self, message: &[u8], sender: &PublicKey) -> Result<RawTransaction> {
        debug!(sender = %sender, message_len = message.len(), "Encrypting raw payload");

        let master_key = self.encryptor.create_master_key();
        let nonce = self.encryptor.random_nonce();

        let encrypted_payload =
            self.encryptor
                .seal_after_precomputation(message, &nonce, &master_key)?;

        let sender_private = self.key_manager.private_key_for_public_key(sender)?;
        let own_key = self.encryptor.compute_shared_key(sender, sender_private)?;
        let encrypted_key = self.encryptor.seal_after_precomputation(
            master_key.expose_secret(),
            &nonce,
            &own_key,
        )?;

        Ok(RawTransaction::new(
            encrypted_payload,
            encrypted_key,
            nonce,
            sender.clone(),
        ))
    }

    /// Re-key a raw transaction for `recipients`.
    ///
    /// The body ciphertext and its nonce are reused unchanged; a fresh
    /// recipient nonce is drawn for the new boxes.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::NoRecipients`] if `recipients` is empty,
    /// [`EnclaveError::KeyNotFound`] if the raw transaction's sender is not a
    /// local key, and a crypto error if its sealed key does not open.
    pub fn encrypt_raw_for_recipients(
        &self,
        raw: &RawTransaction,
        recipients: &[PublicKey],
    ) -> Result<EncodedPayloadWithRecipients> {
        if recipients.is_empty() {
            return Err(EnclaveError::NoRecipients);
        }
        debug!(
            sender = %raw.from(),
            recipients = recipients.len(),
            "Re-keying raw transaction"
        );

        let master_key = self.open_raw_master_key(raw)?;
        let sender_private = self.key_manager.private_key_for_public_key(raw.from())?;

        let recipient_nonce = self.encryptor.random_nonce();
        let recipient_boxes =
            self.seal_master_key(&master_key, sender_private, recipients, &recipient_nonce)?;

        let payload = EncodedPayload::new(
            raw.from().clone(),
            raw.encrypted_payload().to_vec(),
            raw.nonce().clone(),
            recipient_boxes,
            recipient_nonce,
        );
        EncodedPayloadWithRecipients::new(payload, recipients.to_vec())
    }

    /// Recover the plaintext of a raw transaction sealed by this node.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::KeyNotFound`] if the raw transaction's sender
    /// is not a local key, and a crypto error if the sealed key or the body
    /// does not open.
    pub fn unencrypt_raw_payload(&self, raw: &RawTransaction) -> Result<Vec<u8>> {
        debug!(sender = %raw.from(), "Decrypting raw payload");

        let master_key = self.open_raw_master_key(raw)?;
        Ok(self.encryptor.open_after_precomputation(
            raw.encrypted_payload(),
            raw.nonce(),
            &master_key,
        )?)
    }

    /// Recover the plaintext of a payload.
    ///
    /// If the payload's sender is a local key this node is re-reading its own
    /// message and opens the first recipient box. Otherwise this node is a
    /// recipient: `provided_key` names either the local key to use or the
    /// sender, in which case every local key is tried.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::KeyNotFound`] if no usable local key exists,
    /// [`EnclaveError::MissingRecipientBox`] or
    /// [`EnclaveError::AmbiguousRecipientBox`] if no box can be selected, and
    /// a crypto error if authentication fails.
    pub fn unencrypt_transaction(
        &self,
        payload: &EncodedPayloadWithRecipients,
        provided_key: &PublicKey,
    ) -> Result<Vec<u8>> {
        let inner = payload.payload();
        let sender = inner.sender_key();

        debug!(
            sender = %sender,
            provided = %provided_key,
            boxes = inner.recipient_boxes().len(),
            "Decrypting payload"
        );

        let master_key = if self.key_manager.is_local(sender) {
            let counterpart = payload.recipient_keys().first().unwrap_or(provided_key);
            trace!(counterpart = %counterpart, "Payload was sent by this node");
            self.open_box(payload, 0, sender, counterpart)?
        } else {
            self.open_received(payload, provided_key)?
        };

        Ok(self.encryptor.open_after_precomputation(
            inner.cipher_text(),
            inner.cipher_text_nonce(),
            &master_key,
        )?)
    }

    /// Project `payload` for `recipient`, keeping only that recipient's box.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::InvalidRecipient`] if `recipient` is not one
    /// of the payload's recipient keys.
    pub fn add_recipient_to_payload(
        &self,
        payload: &EncodedPayloadWithRecipients,
        recipient: &PublicKey,
    ) -> Result<EncodedPayloadWithRecipients> {
        payload.project_for(recipient)
    }

    /// Seal an existing payload's master key for a new recipient.
    ///
    /// The master key is recovered from the first recipient box, so only the
    /// node holding the payload's sender key can do this. The new box uses
    /// the payload's recipient nonce; append it with
    /// [`EncodedPayloadWithRecipients::with_recipient`] or ship it on its own.
    ///
    /// # Errors
    ///
    /// Returns [`EnclaveError::MissingRecipientBox`] if the payload has no
    /// recipient keys or no recipient boxes,
    /// [`EnclaveError::KeyNotFound`] if the sender is not a local key, and a
    /// crypto error if the first box does not open.
    pub fn create_new_recipient_box(
        &self,
        payload: &EncodedPayloadWithRecipients,
        recipient: &PublicKey,
    ) -> Result<Vec<u8>> {
        let inner = payload.payload();
        let first_recipient = match payload.recipient_keys().first() {
            Some(key) if !inner.recipient_boxes().is_empty() => key,
            _ => return Err(EnclaveError::MissingRecipientBox),
        };
        debug!(
            sender = %inner.sender_key(),
            recipient = %recipient,
            "Creating recipient box"
        );

        let master_key = self.open_box(payload, 0, inner.sender_key(), first_recipient)?;
        let sender_private = self
            .key_manager
            .private_key_for_public_key(inner.sender_key())?;
        self.seal_for(&master_key, sender_private, recipient, inner.recipient_nonce())
    }

    /// The key used when a caller does not name a sender.
    pub fn default_public_key(&self) -> &PublicKey {
        self.key_manager.default_public_key()
    }

    /// All local public keys.
    pub fn public_keys(&self) -> HashSet<PublicKey> {
        self.key_manager.public_keys()
    }

    /// Keys that must be able to read every payload this node originates.
    pub fn forwarding_keys(&self) -> HashSet<PublicKey> {
        self.key_manager.forwarding_keys()
    }

    fn seal_master_key(
        &self,
        master_key: &MasterKey,
        sender_private: &PrivateKey,
        recipients: &[PublicKey],
        recipient_nonce: &Nonce,
    ) -> Result<Vec<Vec<u8>>> {
        recipients
            .iter()
            .map(|recipient| self.seal_for(master_key, sender_private, recipient, recipient_nonce))
            .collect()
    }

    fn seal_for(
        &self,
        master_key: &MasterKey,
        sender_private: &PrivateKey,
        recipient: &PublicKey,
        recipient_nonce: &Nonce,
    ) -> Result<Vec<u8>> {
        let shared = self.encryptor.compute_shared_key(recipient, sender_private)?;
        trace!(recipient = %recipient, "Sealing master key for recipient");
        Ok(self.encryptor.seal_after_precomputation(
            master_key.expose_secret(),
            recipient_nonce,
            &shared,
        )?)
    }

    /// Unwrap a raw transaction's master key with the sender's own shared key.
    fn open_raw_master_key(&self, raw: &RawTransaction) -> Result<MasterKey> {
        let sender_private = self.key_manager.private_key_for_public_key(raw.from())?;
        let own_key = self.encryptor.compute_shared_key(raw.from(), sender_private)?;
        self.open_master_key(raw.encrypted_key(), raw.nonce(), &own_key)
    }

    fn open_master_key(
        &self,
        sealed: &[u8],
        nonce: &Nonce,
        key: &dyn PrecomputedKey,
    ) -> Result<MasterKey> {
        let mut bytes = self.encryptor.open_after_precomputation(sealed, nonce, key)?;
        let master_key = MasterKey::from_bytes(&bytes);
        bytes.zeroize();
        Ok(master_key?)
    }

    /// Open box `index` as `local_key`, with `counterpart` on the other side.
    fn open_box(
        &self,
        payload: &EncodedPayloadWithRecipients,
        index: usize,
        local_key: &PublicKey,
        counterpart: &PublicKey,
    ) -> Result<MasterKey> {
        let inner = payload.payload();
        let recipient_box = inner
            .recipient_boxes()
            .get(index)
            .ok_or(EnclaveError::MissingRecipientBox)?;

        let private_key = self.key_manager.private_key_for_public_key(local_key)?;
        let shared = self.encryptor.compute_shared_key(counterpart, private_key)?;
        self.open_master_key(recipient_box, inner.recipient_nonce(), &shared)
    }

    fn open_received(
        &self,
        payload: &EncodedPayloadWithRecipients,
        provided_key: &PublicKey,
    ) -> Result<MasterKey> {
        let sender = payload.payload().sender_key();

        let candidates: Vec<PublicKey> = if self.key_manager.is_local(provided_key) {
            vec![provided_key.clone()]
        } else if provided_key == sender {
            let default = self.key_manager.default_public_key().clone();
            let mut others: Vec<PublicKey> = self
                .key_manager
                .public_keys()
                .into_iter()
                .filter(|key| key != &default)
                .collect();
            others.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
            std::iter::once(default).chain(others).collect()
        } else {
            return Err(EnclaveError::KeyNotFound(provided_key.to_base64()));
        };

        let mut last_error = EnclaveError::MissingRecipientBox;
        for local_key in &candidates {
            let index = match self.box_index_for(payload, local_key)? {
                Some(index) => index,
                None => continue,
            };
            trace!(local = %local_key, index, "Trying recipient box");
            match self.open_box(payload, index, local_key, sender) {
                Ok(master_key) => return Ok(master_key),
                Err(err) => last_error = err,
            }
        }
        Err(last_error)
    }

    /// The box addressed to `local_key`, if any.
    fn box_index_for(
        &self,
        payload: &EncodedPayloadWithRecipients,
        local_key: &PublicKey,
    ) -> Result<Option<usize>> {
        if !payload.recipient_keys().is_empty() {
            return Ok(payload.recipient_index(local_key));
        }
        match payload.payload().recipient_boxes().len() {
            0 => Err(EnclaveError::MissingRecipientBox),
            1 => Ok(Some(0)),
            boxes => Err(EnclaveError::AmbiguousRecipientBox { boxes }),
        }
    }
}

impl std::fmt::Debug for Enclave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enclave")
            .field("encryptor", &self.encryptor.encryptor_type())
            .finish_non_exhaustive()
    }
}
