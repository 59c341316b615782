//! # Conversation Keys
//!
//! A conversation key is the 32-byte symmetric key shared by exactly two
//! parties, derived from one party's secret key and the other's public key:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     CONVERSATION KEY DERIVATION                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Restore the counterparty's point from its x-coordinate,            │
//! │     assuming an even y (protocol convention)                           │
//! │                                                                         │
//! │  2. ECDH: our_secret × their_point → shared point                      │
//! │     shared_x = x-coordinate of the shared point (32 bytes, BE)         │
//! │                                                                         │
//! │  3. HKDF-extract(salt = "nip44-v2", ikm = shared_x) → 32-byte key      │
//! │                                                                         │
//! │  Commutativity: derive(sk_A, pk_B) == derive(sk_B, pk_A)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed key material never reaches this module: both inputs are typed
//! values that [`crate::keys`] has already validated, so derivation itself is
//! infallible. Conversation keys are ephemeral values: derived per use, never
//! persisted, and zeroized on drop.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::keys::{Keys, PublicKey};

/// Size of a conversation key in bytes
pub const CONVERSATION_KEY_SIZE: usize = 32;

/// HKDF-extract salt fixed by NIP-44 v2
const CONVERSATION_KEY_SALT: &[u8] = b"nip44-v2";

/// A 32-byte symmetric key shared by exactly two parties
///
/// Zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct ConversationKey([u8; CONVERSATION_KEY_SIZE]);

impl ConversationKey {
    /// Derive the conversation key between `keys` and `their_public`.
    ///
    /// The same key comes out of both directions of a conversation: Alice
    /// deriving with Bob's public key gets the byte-identical key Bob derives
    /// with Alice's public key.
    pub fn derive(keys: &Keys, their_public: &PublicKey) -> Self {
        let shared_x = shared_secret_x(keys, their_public);
        let (prk, _) = Hkdf::<Sha256>::extract(Some(CONVERSATION_KEY_SALT), &shared_x);

        let mut key = [0u8; CONVERSATION_KEY_SIZE];
        key.copy_from_slice(&prk);
        Self(key)
    }

    /// Wrap existing key bytes (e.g. a test vector)
    pub fn from_bytes(bytes: [u8; CONVERSATION_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw key bytes (for key expansion)
    pub fn as_bytes(&self) -> &[u8; CONVERSATION_KEY_SIZE] {
        &self.0
    }
}

/// ECDH between our secret scalar and the counterparty's even-y point,
/// returning the shared point's x-coordinate.
///
/// This raw x-coordinate is also what the legacy envelope uses directly as
/// its cipher key, without the extract step above.
pub(crate) fn shared_secret_x(keys: &Keys, their_public: &PublicKey) -> [u8; 32] {
    let point = their_public.to_even_point();
    let shared = secp256k1::ecdh::shared_secret_point(&point, &keys.secret_key());

    // shared_secret_point yields x ‖ y, 64 bytes uncompressed
    let mut x = [0u8; 32];
    x.copy_from_slice(&shared[..32]);
    x
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_commutative() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        let ab = ConversationKey::derive(&alice, &bob.public_key());
        let ba = ConversationKey::derive(&bob, &alice.public_key());

        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        let k1 = ConversationKey::derive(&alice, &bob.public_key());
        let k2 = ConversationKey::derive(&alice, &bob.public_key());

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_counterparties_different_keys() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let carol = Keys::generate();

        let with_bob = ConversationKey::derive(&alice, &bob.public_key());
        let with_carol = ConversationKey::derive(&alice, &carol.public_key());

        assert_ne!(with_bob.as_bytes(), with_carol.as_bytes());
    }

    #[test]
    fn test_key_is_not_the_raw_shared_secret() {
        // the extract step must actually run
        let alice = Keys::generate();
        let bob = Keys::generate();

        let raw = shared_secret_x(&alice, &bob.public_key());
        let key = ConversationKey::derive(&alice, &bob.public_key());

        assert_ne!(&raw, key.as_bytes());
    }
}
