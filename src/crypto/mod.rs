//! # Cryptography Module
//!
//! The symmetric layer: conversation keys and the two message envelopes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  conversation - shared key between exactly two parties          │   │
//! │  │                                                                 │   │
//! │  │  secp256k1 ECDH (even-y convention)                             │   │
//! │  │       └─► shared x-coordinate                                   │   │
//! │  │              └─► HKDF-extract("nip44-v2") → ConversationKey     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  nip44 - versioned envelope (all new content)                   │   │
//! │  │                                                                 │   │
//! │  │  HKDF-expand → (ChaCha20 key, ChaCha20 nonce, HMAC key)         │   │
//! │  │  pad → encrypt → MAC(nonce ‖ ciphertext) → base64               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  nip04 - legacy envelope (decrypt-only in practice)             │   │
//! │  │                                                                 │   │
//! │  │  raw shared x-coordinate as AES-256-CBC key, "ct?iv=iv" form    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All operations here are synchronous, CPU-bound, and free of shared mutable
//! state; keys are derived fresh per call and zeroized on drop. The only
//! shared resource is the OS random source. Determinism for tests comes from
//! injecting nonces and keys through parameters, never from switching the
//! random source off globally.

pub mod conversation;
pub mod nip04;
pub mod nip44;

pub use conversation::{ConversationKey, CONVERSATION_KEY_SIZE};
pub use nip44::{MessageKeys, Nonce};
