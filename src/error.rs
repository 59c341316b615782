//! # Error Handling
//!
//! This module provides the error types for Murmur Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Key Errors                                                        │
//! │  │   └── InvalidKey            - Malformed secret or public key        │
//! │  │                                                                      │
//! │  ├── Envelope Errors (v2)                                              │
//! │  │   ├── InvalidLength         - Key/nonce not exactly 32 bytes        │
//! │  │   ├── InvalidSize           - Plaintext/payload outside bounds      │
//! │  │   ├── InvalidPadding        - Length prefix disagrees with buffer   │
//! │  │   ├── InvalidAad            - Associated data is not a 32-byte nonce│
//! │  │   ├── InvalidEncoding       - Payload is not valid base64           │
//! │  │   ├── UnsupportedVersion    - Version byte other than 2             │
//! │  │   └── InvalidMac            - Authentication tag mismatch           │
//! │  │                                                                      │
//! │  ├── Envelope Errors (legacy v1)                                       │
//! │  │   ├── InvalidFormat         - Missing "?iv=" or bad base64 segment  │
//! │  │   └── DecryptionFailed      - Block cipher rejected the ciphertext  │
//! │  │                                                                      │
//! │  ├── Direct Message Errors                                             │
//! │  │   ├── NotAddressedToRecipient - No recipient tag for our key        │
//! │  │   ├── MalformedSeal         - Seal is unparseable or unsigned       │
//! │  │   ├── UnwrapFailed          - Outer envelope would not decrypt      │
//! │  │   └── UnsealFailed          - Inner envelope would not decrypt      │
//! │  │                                                                      │
//! │  └── Ambient Errors                                                    │
//! │      ├── SigningFailed         - Schnorr signing/verification failed   │
//! │      └── Serialization         - Event JSON (de)serialization failed   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every cryptographic or structural violation surfaces immediately as a typed
//! failure; nothing is retried or defaulted inside this crate. Callers that
//! expose decryption results to untrusted parties should collapse all variants
//! into a single "cannot read this message" answer so the failure mode does
//! not become an oracle.

use thiserror::Error;

/// Result type alias for Murmur Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Murmur Core
///
/// All errors are categorized by layer (keys, envelopes, message flow) to make
/// error handling clearer and to provide meaningful messages to callers.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Key Errors
    // ========================================================================

    /// Secret or public key is malformed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ========================================================================
    // Envelope Errors (v2)
    // ========================================================================

    /// Conversation key or nonce has the wrong length
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// Plaintext or payload size is outside the allowed bounds
    #[error("Invalid size: {0}")]
    InvalidSize(String),

    /// Padded buffer disagrees with its declared plaintext length
    #[error("Invalid padding: {0}")]
    InvalidPadding(String),

    /// Associated data is not the expected 32-byte nonce
    #[error("Invalid AAD: {0}")]
    InvalidAad(String),

    /// Payload is not valid base64
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Envelope carries a version this implementation does not speak
    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(String),

    /// Authentication tag mismatch.
    ///
    /// Carries no detail: the verifier compares the full tag in constant time
    /// and reports nothing about where the mismatch occurred.
    #[error("Invalid MAC")]
    InvalidMac,

    // ========================================================================
    // Envelope Errors (legacy v1)
    // ========================================================================

    /// Legacy envelope is structurally broken
    #[error("Invalid legacy envelope: {0}")]
    InvalidFormat(String),

    /// Legacy block cipher rejected the ciphertext
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    // ========================================================================
    // Direct Message Errors
    // ========================================================================

    /// Gift wrap carries no recipient tag matching our public key
    #[error("Gift wrap is not addressed to this recipient")]
    NotAddressedToRecipient,

    /// Decrypted seal is unparseable, unsigned, or missing its author
    #[error("Malformed seal: {0}")]
    MalformedSeal(String),

    /// Outer gift-wrap envelope failed to decrypt
    #[error("Failed to unwrap gift wrap: {0}")]
    UnwrapFailed(String),

    /// Inner seal envelope failed to decrypt
    #[error("Failed to open seal: {0}")]
    UnsealFailed(String),

    // ========================================================================
    // Ambient Errors
    // ========================================================================

    /// Schnorr signing or signature verification failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Event (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::InvalidKey("expected 32 bytes".into());
        assert!(err.to_string().contains("expected 32 bytes"));

        assert_eq!(Error::InvalidMac.to_string(), "Invalid MAC");
        assert_eq!(
            Error::NotAddressedToRecipient.to_string(),
            "Gift wrap is not addressed to this recipient"
        );
    }

    #[test]
    fn test_serde_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
