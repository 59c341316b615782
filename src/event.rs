//! # Events
//!
//! The signed content object every layer of the protocol exchanges.
//!
//! An event binds together an author, a timestamp, a kind, a tag list, and a
//! content string. Its identity is the SHA-256 of a canonical JSON array, and
//! its authenticity is a BIP-340 Schnorr signature over that digest:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        EVENT IDENTITY & SIGNATURE                       │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  canonical = [0, pubkey, created_at, kind, tags, content]  (JSON)      │
//! │                                                                         │
//! │  id  = SHA-256(canonical)                    (32 bytes, hex on wire)   │
//! │  sig = schnorr_sign(id, author keypair)      (64 bytes, hex on wire)   │
//! │                                                                         │
//! │  The same canonical serialization is what the envelope layer encrypts: │
//! │  a sealed message is the JSON wire form of a signed event.             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`EventDraft`] is the unsigned precursor; [`EventDraft::sign`] computes the
//! id and signature and yields an immutable [`Event`].

use secp256k1::schnorr::Signature;
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::keys::{Keys, PublicKey};
use crate::time::now_timestamp;

/// Size of a Schnorr signature in bytes
pub const SIGNATURE_SIZE: usize = 64;

/// Size of an event id in bytes
pub const ID_SIZE: usize = 32;

// ============================================================================
// EVENT
// ============================================================================

/// A signed, immutable protocol event
///
/// Field encodings follow the wire form: `id`, `pubkey`, and `sig` are
/// lowercase hex. The JSON serialization of this struct is exactly what
/// relays accept and what the envelope layer encrypts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// SHA-256 of the canonical serialization (64 hex chars)
    pub id: String,
    /// Author's x-only public key (64 hex chars)
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind
    pub kind: u16,
    /// Tag list; each tag is a list of strings, first element is the name
    pub tags: Vec<Vec<String>>,
    /// Content payload (plaintext or an encrypted envelope, by kind)
    pub content: String,
    /// Schnorr signature over the id digest (128 hex chars)
    pub sig: String,
}

impl Event {
    /// Parse an event from its JSON wire form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to the JSON wire form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The author's public key, parsed from the `pubkey` field
    pub fn author(&self) -> Result<PublicKey> {
        PublicKey::from_hex(&self.pubkey)
    }

    /// First value of the first tag named `name`, if any
    pub fn first_tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.first().map(String::as_str) == Some(name))
            .and_then(|tag| tag.get(1))
            .map(String::as_str)
    }

    /// Verify the event id and signature
    ///
    /// Recomputes the canonical digest, checks it against `id`, then checks
    /// the Schnorr signature against the author's key. Fails with
    /// [`Error::SigningFailed`] on any mismatch.
    pub fn verify(&self) -> Result<()> {
        let digest = canonical_digest(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        );

        if hex::encode(digest) != self.id {
            return Err(Error::SigningFailed(
                "event id does not match its content".into(),
            ));
        }

        let sig_bytes = hex::decode(&self.sig)
            .map_err(|e| Error::SigningFailed(format!("Invalid signature hex: {}", e)))?;
        let sig = Signature::from_slice(&sig_bytes)
            .map_err(|e| Error::SigningFailed(format!("Invalid signature: {}", e)))?;

        let author = self.author()?;
        let secp = Secp256k1::new();
        secp.verify_schnorr(&sig, &Message::from_digest(digest), author.x_only())
            .map_err(|_| Error::SigningFailed("signature verification failed".into()))
    }
}

// ============================================================================
// EVENT DRAFT
// ============================================================================

/// An unsigned event under construction
///
/// Collects kind, content, tags, and timestamp; [`sign`](Self::sign) fixes
/// the author, computes the id, and produces the final [`Event`].
#[derive(Debug, Clone)]
pub struct EventDraft {
    /// Event kind
    pub kind: u16,
    /// Content payload
    pub content: String,
    /// Tag list
    pub tags: Vec<Vec<String>>,
    /// Unix timestamp in seconds
    pub created_at: u64,
}

impl EventDraft {
    /// Start a draft with the current timestamp and no tags
    pub fn new(kind: u16, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            tags: Vec::new(),
            created_at: now_timestamp(),
        }
    }

    /// Append one tag
    pub fn tag(mut self, tag: Vec<String>) -> Self {
        self.tags.push(tag);
        self
    }

    /// Override the timestamp
    pub fn created_at(mut self, created_at: u64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sign the draft, producing a complete event
    pub fn sign(self, keys: &Keys) -> Result<Event> {
        let pubkey = keys.public_key().to_hex();
        let digest = canonical_digest(&pubkey, self.created_at, self.kind, &self.tags, &self.content);

        let secp = Secp256k1::new();
        // deterministic BIP-340 signing: no auxiliary randomness, so the same
        // draft signed twice yields the same event
        let sig = secp.sign_schnorr_no_aux_rand(&Message::from_digest(digest), keys.keypair());

        Ok(Event {
            id: hex::encode(digest),
            pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: hex::encode(sig.serialize()),
        })
    }
}

// ============================================================================
// CANONICAL SERIALIZATION
// ============================================================================

/// SHA-256 over the canonical `[0, pubkey, created_at, kind, tags, content]`
/// JSON array. This digest is both the event id and the signing message.
fn canonical_digest(
    pubkey: &str,
    created_at: u64,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> [u8; ID_SIZE] {
    let canonical = serde_json::json!([0, pubkey, created_at, kind, tags, content]).to_string();
    Sha256::digest(canonical.as_bytes()).into()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(keys: &Keys) -> Event {
        EventDraft::new(1, "hello world")
            .tag(vec!["t".into(), "greeting".into()])
            .sign(keys)
            .unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = Keys::generate();
        let event = sample_event(&keys);

        assert_eq!(event.pubkey, keys.public_key().to_hex());
        assert_eq!(event.id.len(), ID_SIZE * 2);
        assert_eq!(event.sig.len(), SIGNATURE_SIZE * 2);
        event.verify().unwrap();
    }

    #[test]
    fn test_id_is_deterministic() {
        let keys = Keys::generate();
        let draft = EventDraft::new(1, "same content").created_at(1_700_000_000);

        let a = draft.clone().sign(&keys).unwrap();
        let b = draft.sign(&keys).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_id_changes_with_content() {
        let keys = Keys::generate();
        let a = EventDraft::new(1, "one").created_at(1_700_000_000).sign(&keys).unwrap();
        let b = EventDraft::new(1, "two").created_at(1_700_000_000).sign(&keys).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_tampered_content_fails_verification() {
        let keys = Keys::generate();
        let mut event = sample_event(&keys);

        event.content = "altered".into();
        assert!(event.verify().is_err());
    }

    #[test]
    fn test_foreign_signature_fails_verification() {
        let alice = Keys::generate();
        let mallory = Keys::generate();

        let mut event = sample_event(&alice);
        // graft Mallory's identity onto Alice's signed content
        event.pubkey = mallory.public_key().to_hex();
        assert!(event.verify().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let keys = Keys::generate();
        let event = sample_event(&keys);

        let json = event.to_json().unwrap();
        let restored = Event::from_json(&json).unwrap();

        assert_eq!(restored, event);
        restored.verify().unwrap();
    }

    #[test]
    fn test_first_tag_value() {
        let keys = Keys::generate();
        let event = EventDraft::new(1, "")
            .tag(vec!["p".into(), "abc".into()])
            .tag(vec!["p".into(), "def".into()])
            .sign(&keys)
            .unwrap();

        assert_eq!(event.first_tag_value("p"), Some("abc"));
        assert_eq!(event.first_tag_value("e"), None);
    }
}
