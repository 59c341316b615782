//! # Murmur Core
//!
//! The end-to-end confidentiality core of Murmur, a private messenger built
//! on the Nostr protocol. This crate turns plaintext between two keypairs
//! into metadata-resistant envelopes that can cross public, untrusted relays,
//! and turns received envelopes back into verified messages.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MURMUR CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  messaging - seal, gift wrap, send/receive direct messages       │  │
//! │  └───────────────┬──────────────────────────────────────────────────┘  │
//! │                  │                                                      │
//! │  ┌───────────────▼───────────────┐  ┌──────────────────────────────┐   │
//! │  │  event - signed content       │  │  crypto - conversation keys, │   │
//! │  │  objects (id, tags, Schnorr)  │  │  v2 + legacy envelopes       │   │
//! │  └───────────────┬───────────────┘  └───────────────┬──────────────┘   │
//! │                  │                                  │                  │
//! │  ┌───────────────▼──────────────────────────────────▼──────────────┐   │
//! │  │  keys - secp256k1 key material (hex / nsec / npub forms)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`keys`] - Key material (generation, parsing, bech32 forms)
//! - [`event`] - Signed content objects and canonical serialization
//! - [`crypto`] - Conversation keys and the message envelopes
//! - [`messaging`] - Seal / gift-wrap layering and the direct-message flow
//! - [`time`] - Timestamp helper
//!
//! ## Privacy Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PRIVACY LAYERS                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer 1: Confidentiality (v2 envelope)                                │
//! │  ──────────────────────────────────────                                 │
//! │  ChaCha20 under a per-message key; HMAC-SHA256 verified before         │
//! │  decryption; padding buckets hide exact plaintext lengths.             │
//! │                                                                         │
//! │  Layer 2: Sender anonymity (gift wrap)                                 │
//! │  ─────────────────────────────────────                                  │
//! │  The event a relay sees is signed by a single-use random key and       │
//! │  names only its recipient. The true author is sealed inside.           │
//! │                                                                         │
//! │  Layer 3: Unlinkability (two wraps per message)                        │
//! │  ──────────────────────────────────────────────                         │
//! │  Receiver copy and sender archival copy share no keys and cannot       │
//! │  be correlated in transit.                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport, persistence, relay selection, and subscription semantics live
//! in higher layers; this crate takes byte strings in and hands events out.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod crypto;
pub mod error;
pub mod event;
pub mod keys;
pub mod messaging;
/// Time utilities.
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use crypto::{ConversationKey, Nonce};
pub use error::{Error, Result};
pub use event::{Event, EventDraft};
pub use keys::{Keys, PublicKey};
pub use messaging::{
    gift_wrap, receive_private_message, seal, send_private_message, PrivateMessage,
};
