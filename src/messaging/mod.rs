//! # Private Direct Messages
//!
//! The seal + gift wrap layering (NIP-59) and the private direct-message flow
//! built on it (NIP-17). Messages travel through public, untrusted relays
//! without exposing the sender's identity or linkable metadata.
//!
//! ## Sending
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SEND: THREE LAYERS                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  message (kind 14)         signed by SENDER, tagged for receiver       │
//! │       │                                                                 │
//! │       │  v2-encrypt under ConversationKey(sender, receiver)            │
//! │       ▼                                                                 │
//! │  seal (kind 13)            signed by SENDER, NO tags                   │
//! │       │                                                                 │
//! │       │  v2-encrypt under ConversationKey(single-use key, recipient)   │
//! │       ▼                                                                 │
//! │  gift wrap (kind 1059)     signed by the SINGLE-USE key,               │
//! │                            one ["p", recipient] tag                    │
//! │                                                                         │
//! │  The wrap is built twice from the one seal: once addressed to the      │
//! │  receiver, once back to the sender as an archival copy. The two wraps  │
//! │  share no keys and are unlinkable in transit.                          │
//! │                                                                         │
//! │  A relay observer learns: a random public key, one recipient, and a    │
//! │  ciphertext. Nothing else.                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Receiving
//!
//! Construction order, reversed exactly: unwrap with
//! ConversationKey(my secret, wrap author), validate the revealed seal,
//! unseal with ConversationKey(my secret, seal author), parse the message.
//!
//! ## Timestamps
//!
//! Seals and wraps are stamped with the real current time. NIP-59 recommends
//! randomly backdating `created_at` (up to about two days) so relay arrival
//! times cannot be correlated against the embedded timestamps; that
//! mitigation is not implemented here and the weakness is observable.
//! TODO: randomize seal/wrap created_at within the two-day window NIP-59
//! allows.

use crate::crypto::conversation::ConversationKey;
use crate::crypto::nip44;
use crate::error::{Error, Result};
use crate::event::{Event, EventDraft};
use crate::keys::{Keys, PublicKey};

/// Kind of the innermost private message event
pub const KIND_PRIVATE_MESSAGE: u16 = 14;

/// Kind of a seal event
pub const KIND_SEAL: u16 = 13;

/// Kind of a gift-wrap event
pub const KIND_GIFT_WRAP: u16 = 1059;

/// Tag name addressing a recipient public key
const RECIPIENT_TAG: &str = "p";

/// Tag name referencing the message being replied to
const REPLY_TAG: &str = "e";

// ============================================================================
// SEAL
// ============================================================================

/// Seal a signed message for `receiver`.
///
/// The message's JSON wire form becomes the plaintext of one v2 envelope
/// under ConversationKey(sender, receiver); the resulting kind-13 event is
/// signed by the sender's real key and carries no tags. Nothing outside the
/// ciphertext may hint at the content or its destination.
pub fn seal(message: &Event, sender: &Keys, receiver: &PublicKey) -> Result<Event> {
    let conversation_key = ConversationKey::derive(sender, receiver);
    let ciphertext = nip44::encrypt(message.to_json()?.as_bytes(), &conversation_key)?;

    EventDraft::new(KIND_SEAL, ciphertext).sign(sender)
}

// ============================================================================
// GIFT WRAP
// ============================================================================

/// Wrap a seal for `receiver` under a freshly generated single-use key.
///
/// The wrap is authored and signed by the throwaway key (never the real
/// sender) and carries exactly one `["p", receiver]` tag. An observer learns
/// only a random public key and the declared recipient.
pub fn gift_wrap(seal: &Event, receiver: &PublicKey) -> Result<Event> {
    gift_wrap_with_keys(seal, receiver, &Keys::generate())
}

/// Wrap a seal using caller-supplied single-use keys.
///
/// This is [`gift_wrap`] with the ephemeral keypair injected, for
/// deterministic tests. `wrap_keys` must never be an identity key and must
/// never be reused across wraps.
pub fn gift_wrap_with_keys(seal: &Event, receiver: &PublicKey, wrap_keys: &Keys) -> Result<Event> {
    let conversation_key = ConversationKey::derive(wrap_keys, receiver);
    let ciphertext = nip44::encrypt(seal.to_json()?.as_bytes(), &conversation_key)?;

    EventDraft::new(KIND_GIFT_WRAP, ciphertext)
        .tag(vec![RECIPIENT_TAG.to_string(), receiver.to_hex()])
        .sign(wrap_keys)
}

// ============================================================================
// DIRECT MESSAGE FLOW
// ============================================================================

/// Everything produced by one [`send_private_message`] call
///
/// The two wraps encrypt the same seal under independent single-use keys and
/// independent conversation keys; publish them separately. The seal and the
/// inner message never travel in the clear; they are returned so callers can
/// archive or inspect what was sent.
#[derive(Debug)]
pub struct PrivateMessage {
    /// The inner kind-14 message, signed by the sender
    pub message: Event,
    /// The kind-13 seal both wraps contain
    pub seal: Event,
    /// Gift wrap addressed to the receiver; deliver this
    pub receiver_wrap: Event,
    /// Gift wrap addressed back to the sender, the archival copy
    pub sender_wrap: Event,
}

/// Compose, seal, and double-wrap a private message for `receiver`.
///
/// The message body is `text`; it is tagged for the receiver, optionally
/// tagged as a reply to `reply_to`, and any `extra_tags` are appended. The
/// sender's real public key appears only inside the encrypted layers.
pub fn send_private_message(
    sender: &Keys,
    receiver: &PublicKey,
    text: &str,
    extra_tags: Vec<Vec<String>>,
    reply_to: Option<&str>,
) -> Result<PrivateMessage> {
    let mut draft = EventDraft::new(KIND_PRIVATE_MESSAGE, text)
        .tag(vec![RECIPIENT_TAG.to_string(), receiver.to_hex()]);
    if let Some(parent_id) = reply_to {
        draft = draft.tag(vec![REPLY_TAG.to_string(), parent_id.to_string()]);
    }
    for tag in extra_tags {
        draft = draft.tag(tag);
    }

    let message = draft.sign(sender)?;
    let sealed = seal(&message, sender, receiver)?;

    let receiver_wrap = gift_wrap(&sealed, receiver)?;
    let sender_wrap = gift_wrap(&sealed, &sender.public_key())?;

    tracing::debug!(
        "Sealed private message for {} (wraps {} and {})",
        receiver.to_hex(),
        receiver_wrap.id,
        sender_wrap.id
    );

    Ok(PrivateMessage {
        message,
        seal: sealed,
        receiver_wrap,
        sender_wrap,
    })
}

/// Unwrap, validate, and unseal a received gift wrap.
///
/// Runs the construction in reverse: decrypt the wrap with
/// ConversationKey(my secret, wrap author), validate the revealed seal,
/// decrypt the seal with ConversationKey(my secret, seal author), and return
/// the inner message event.
///
/// With `verify_addressing` enabled (the default posture), a wrap whose
/// recipient tag does not name our key fails early with
/// [`Error::NotAddressedToRecipient`]. Disabling the check merely delays the
/// failure: the conversation key will not match and the MAC rejects the
/// envelope.
///
/// Callers relaying results to untrusted parties should collapse every error
/// from this function into one generic failure; distinguishing them builds an
/// oracle.
pub fn receive_private_message(
    wrap: &Event,
    recipient: &Keys,
    verify_addressing: bool,
) -> Result<Event> {
    let my_hex = recipient.public_key().to_hex();

    if verify_addressing {
        let addressed = wrap.tags.iter().any(|tag| {
            tag.first().map(String::as_str) == Some(RECIPIENT_TAG)
                && tag.get(1).map(String::as_str) == Some(my_hex.as_str())
        });
        if !addressed {
            return Err(Error::NotAddressedToRecipient);
        }
    }

    // Hop 1: open the wrap with the ephemeral author's key
    let wrap_author = wrap
        .author()
        .map_err(|e| Error::UnwrapFailed(e.to_string()))?;
    let wrap_key = ConversationKey::derive(recipient, &wrap_author);
    let seal_bytes = nip44::decrypt(&wrap.content, &wrap_key)
        .map_err(|e| Error::UnwrapFailed(e.to_string()))?;
    let seal_json = String::from_utf8(seal_bytes)
        .map_err(|_| Error::UnwrapFailed("seal is not valid UTF-8".into()))?;

    // Validate the revealed seal before trusting its author field
    let sealed: Event = Event::from_json(&seal_json)
        .map_err(|e| Error::MalformedSeal(e.to_string()))?;
    if sealed.kind != KIND_SEAL {
        return Err(Error::MalformedSeal(format!(
            "expected kind {}, got {}",
            KIND_SEAL, sealed.kind
        )));
    }
    let seal_author = sealed
        .author()
        .map_err(|_| Error::MalformedSeal("seal has no usable author key".into()))?;
    sealed
        .verify()
        .map_err(|e| Error::MalformedSeal(e.to_string()))?;

    // Hop 2: open the seal with the true sender's key
    let seal_key = ConversationKey::derive(recipient, &seal_author);
    let message_bytes = nip44::decrypt(&sealed.content, &seal_key)
        .map_err(|e| Error::UnsealFailed(e.to_string()))?;
    let message_json = String::from_utf8(message_bytes)
        .map_err(|_| Error::UnsealFailed("message is not valid UTF-8".into()))?;
    let message = Event::from_json(&message_json)
        .map_err(|e| Error::UnsealFailed(e.to_string()))?;

    // The seal signer must be the message author, or the seal launders
    // someone else's message under its own identity
    if message.pubkey != sealed.pubkey {
        return Err(Error::MalformedSeal(
            "seal author differs from message author".into(),
        ));
    }

    tracing::debug!("Unwrapped private message from {}", message.pubkey);

    Ok(message)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now_timestamp;

    fn send_hello() -> (Keys, Keys, PrivateMessage) {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let dm = send_private_message(
            &alice,
            &bob.public_key(),
            "hello bob",
            Vec::new(),
            None,
        )
        .unwrap();
        (alice, bob, dm)
    }

    #[test]
    fn test_receiver_reads_receiver_wrap() {
        let (alice, bob, dm) = send_hello();

        let message = receive_private_message(&dm.receiver_wrap, &bob, true).unwrap();

        assert_eq!(message.content, "hello bob");
        assert_eq!(message.kind, KIND_PRIVATE_MESSAGE);
        assert_eq!(message.pubkey, alice.public_key().to_hex());
        assert_eq!(
            message.first_tag_value(RECIPIENT_TAG),
            Some(bob.public_key().to_hex().as_str())
        );
    }

    #[test]
    fn test_sender_reads_archival_wrap() {
        let (alice, _bob, dm) = send_hello();

        let message = receive_private_message(&dm.sender_wrap, &alice, true).unwrap();
        assert_eq!(message.content, "hello bob");
    }

    #[test]
    fn test_seal_carries_no_metadata() {
        let (alice, _bob, dm) = send_hello();

        assert_eq!(dm.seal.kind, KIND_SEAL);
        assert!(dm.seal.tags.is_empty());
        assert_eq!(dm.seal.pubkey, alice.public_key().to_hex());
        dm.seal.verify().unwrap();
    }

    #[test]
    fn test_wraps_hide_the_sender() {
        let (alice, bob, dm) = send_hello();
        let alice_hex = alice.public_key().to_hex();
        let bob_hex = bob.public_key().to_hex();

        for wrap in [&dm.receiver_wrap, &dm.sender_wrap] {
            assert_eq!(wrap.kind, KIND_GIFT_WRAP);
            // authored by a throwaway key, not a party to the conversation
            assert_ne!(wrap.pubkey, alice_hex);
            assert_ne!(wrap.pubkey, bob_hex);
            wrap.verify().unwrap();
        }

        // the two wraps share nothing observable but the kind
        assert_ne!(dm.receiver_wrap.pubkey, dm.sender_wrap.pubkey);
        assert_ne!(dm.receiver_wrap.content, dm.sender_wrap.content);

        assert_eq!(
            dm.receiver_wrap.first_tag_value(RECIPIENT_TAG),
            Some(bob_hex.as_str())
        );
        assert_eq!(
            dm.sender_wrap.first_tag_value(RECIPIENT_TAG),
            Some(alice_hex.as_str())
        );
    }

    #[test]
    fn test_reply_and_extra_tags_survive() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        let dm = send_private_message(
            &alice,
            &bob.public_key(),
            "re: earlier",
            vec![vec!["subject".into(), "lunch".into()]],
            Some("aa".repeat(32).as_str()),
        )
        .unwrap();

        let message = receive_private_message(&dm.receiver_wrap, &bob, true).unwrap();
        assert_eq!(message.first_tag_value(REPLY_TAG), Some("aa".repeat(32).as_str()));
        assert_eq!(message.first_tag_value("subject"), Some("lunch"));
    }

    #[test]
    fn test_third_party_is_rejected_by_addressing() {
        let (_alice, _bob, dm) = send_hello();
        let charlie = Keys::generate();

        let result = receive_private_message(&dm.receiver_wrap, &charlie, true);
        assert!(matches!(result, Err(Error::NotAddressedToRecipient)));
    }

    #[test]
    fn test_third_party_is_rejected_by_mac() {
        let (_alice, _bob, dm) = send_hello();
        let charlie = Keys::generate();

        // skipping the addressing check only moves the failure into the MAC
        let result = receive_private_message(&dm.receiver_wrap, &charlie, false);
        assert!(matches!(result, Err(Error::UnwrapFailed(_))));
    }

    #[test]
    fn test_tampered_wrap_content_fails() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

        let (_alice, bob, dm) = send_hello();

        let mut wrap = dm.receiver_wrap.clone();
        let mut envelope = BASE64.decode(&wrap.content).unwrap();
        envelope[40] ^= 0x01; // inside the ciphertext region
        wrap.content = BASE64.encode(envelope);

        let result = receive_private_message(&wrap, &bob, true);
        assert!(matches!(result, Err(Error::UnwrapFailed(_))));
    }

    #[test]
    fn test_wrap_with_injected_keys_is_deterministic_author() {
        let (_alice, bob, dm) = send_hello();
        let wrap_keys = Keys::generate();

        let wrap = gift_wrap_with_keys(&dm.seal, &bob.public_key(), &wrap_keys).unwrap();
        assert_eq!(wrap.pubkey, wrap_keys.public_key().to_hex());

        let message = receive_private_message(&wrap, &bob, true).unwrap();
        assert_eq!(message.content, "hello bob");
    }

    #[test]
    fn test_seal_signed_by_stranger_is_rejected() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let mallory = Keys::generate();

        // Mallory re-seals Alice's signed message under her own key
        let dm = send_private_message(&alice, &bob.public_key(), "hi", Vec::new(), None).unwrap();
        let forged_seal = seal(&dm.message, &mallory, &bob.public_key()).unwrap();
        let forged_wrap = gift_wrap(&forged_seal, &bob.public_key()).unwrap();

        let result = receive_private_message(&forged_wrap, &bob, true);
        assert!(matches!(result, Err(Error::MalformedSeal(_))));
    }

    #[test]
    fn test_timestamps_are_not_backdated() {
        // NIP-59 recommends randomly backdating seal/wrap timestamps to
        // resist timing correlation; current behavior stamps real time.
        // This pins the observed behavior so a future mitigation is a
        // deliberate, test-visible change.
        let (_alice, _bob, dm) = send_hello();
        let now = now_timestamp();

        for event in [&dm.seal, &dm.receiver_wrap, &dm.sender_wrap] {
            assert!(now - event.created_at < 30, "timestamp was shifted");
        }
    }
}
