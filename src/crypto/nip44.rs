//! # Versioned Message Envelope (v2)
//!
//! Authenticated encryption for all private content, implementing NIP-44 v2.
//!
//! ## Envelope Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        V2 ENVELOPE (before base64)                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────┬──────────────┬─────────────────────────┬──────────────┐   │
//! │  │ version │    nonce     │       ciphertext        │     MAC      │   │
//! │  │ 1 byte  │   32 bytes   │  2 + padded_len bytes   │   32 bytes   │   │
//! │  │  (= 2)  │              │                         │              │   │
//! │  └─────────┴──────────────┴─────────────────────────┴──────────────┘   │
//! │                                                                         │
//! │  ciphertext = ChaCha20( u16_be(len) ‖ plaintext ‖ zero padding )       │
//! │  MAC        = HMAC-SHA256(hmac_key, nonce ‖ ciphertext)                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Expansion
//!
//! ```text
//! HKDF-expand(prk = conversation_key, info = nonce, L = 76)
//!       │
//!       ├── bytes  0..32  → ChaCha20 key
//!       ├── bytes 32..44  → ChaCha20 nonce (12 bytes)
//!       └── bytes 44..76  → HMAC-SHA256 key
//! ```
//!
//! The per-message keys depend on both the conversation key and the 32-byte
//! envelope nonce. Reusing a nonce for two different plaintexts under the same
//! conversation key reuses the ChaCha20 keystream and breaks confidentiality;
//! the caller owns nonce uniqueness (random nonces from [`Nonce::random`] make
//! collisions negligible), this module does not detect reuse.
//!
//! ## Padding
//!
//! Plaintext lengths are hidden inside logarithmic buckets: lengths up to 32
//! pad to 32; beyond that the bucket granularity is 32 bytes up to a 256-byte
//! ceiling, then an eighth of the next power of two. This bounds overhead
//! while hiding exact lengths; see [`calc_padded_len`].
//!
//! Decryption verifies the MAC in constant time before touching the
//! ciphertext, so padding and framing errors are unreachable for an attacker
//! without the key (no padding oracle).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::crypto::conversation::ConversationKey;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Envelope version byte
pub const VERSION: u8 = 2;

/// Size of the envelope nonce in bytes
pub const NONCE_SIZE: usize = 32;

/// Size of the authentication tag in bytes
pub const MAC_SIZE: usize = 32;

/// Smallest accepted plaintext length
pub const MIN_PLAINTEXT_SIZE: usize = 1;

/// Largest accepted plaintext length
pub const MAX_PLAINTEXT_SIZE: usize = 65535;

/// Smallest padded plaintext length
pub const MIN_PADDED_SIZE: usize = 32;

/// Version byte plus nonce
const HEADER_SIZE: usize = 1 + NONCE_SIZE;

/// Smallest possible decoded payload:
/// header + length prefix + minimum padding + MAC
const MIN_PAYLOAD_SIZE: usize = HEADER_SIZE + 2 + MIN_PADDED_SIZE + MAC_SIZE;

/// Largest possible decoded payload:
/// header + length prefix + padded 65535-byte plaintext + MAC
const MAX_PAYLOAD_SIZE: usize = HEADER_SIZE + 2 + 65536 + MAC_SIZE;

// ============================================================================
// NONCE
// ============================================================================

/// A 32-byte envelope nonce, unique per encryption
///
/// Drawn from the OS random source by default; tests inject fixed values via
/// [`Nonce::from_bytes`] for deterministic envelopes.
#[derive(Clone, Copy, Debug)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

// ============================================================================
// MESSAGE KEYS
// ============================================================================

/// Per-message key material expanded from (conversation key, nonce)
///
/// Never reused across plaintexts; zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct MessageKeys {
    /// ChaCha20 cipher key
    chacha_key: [u8; 32],
    /// ChaCha20 cipher nonce
    chacha_nonce: [u8; 12],
    /// HMAC-SHA256 authentication key
    hmac_key: [u8; 32],
}

impl MessageKeys {
    /// Expand a conversation key and nonce into per-message keys.
    ///
    /// Fails with [`Error::InvalidLength`] unless the nonce is exactly
    /// 32 bytes (the conversation key's size is enforced by its type).
    pub fn expand(conversation_key: &ConversationKey, nonce: &[u8]) -> Result<Self> {
        if nonce.len() != NONCE_SIZE {
            return Err(Error::InvalidLength(format!(
                "Nonce must be {} bytes, got {}",
                NONCE_SIZE,
                nonce.len()
            )));
        }

        let hkdf = Hkdf::<Sha256>::from_prk(conversation_key.as_bytes())
            .map_err(|_| Error::InvalidLength("Conversation key must be 32 bytes".into()))?;

        let mut okm = [0u8; 76];
        hkdf.expand(nonce, &mut okm)
            .map_err(|_| Error::InvalidLength("Key expansion failed".into()))?;

        let mut keys = Self {
            chacha_key: [0u8; 32],
            chacha_nonce: [0u8; 12],
            hmac_key: [0u8; 32],
        };
        keys.chacha_key.copy_from_slice(&okm[0..32]);
        keys.chacha_nonce.copy_from_slice(&okm[32..44]);
        keys.hmac_key.copy_from_slice(&okm[44..76]);
        Ok(keys)
    }
}

// ============================================================================
// PADDING
// ============================================================================

/// Padded length for a plaintext of `len` bytes.
///
/// Lengths up to 32 occupy the minimum 32-byte bucket. Above that, with N the
/// next power of two ≥ `len`, the bucket granularity is 32 bytes while
/// N ≤ 256 and N/8 beyond, and the result is `len` rounded up to a multiple
/// of the granularity. Reproduced exactly: interoperability depends on both
/// sides computing identical buckets.
pub fn calc_padded_len(len: usize) -> usize {
    if len <= MIN_PADDED_SIZE {
        return MIN_PADDED_SIZE;
    }
    let next_power = len.next_power_of_two();
    let chunk = if next_power <= 256 { 32 } else { next_power / 8 };
    chunk * ((len - 1) / chunk + 1)
}

/// Frame and pad a plaintext: `u16_be(len) ‖ plaintext ‖ zeros`.
///
/// Fails with [`Error::InvalidSize`] outside the [1, 65535] byte bounds.
fn pad(plaintext: &[u8]) -> Result<Vec<u8>> {
    let len = plaintext.len();
    if !(MIN_PLAINTEXT_SIZE..=MAX_PLAINTEXT_SIZE).contains(&len) {
        return Err(Error::InvalidSize(format!(
            "Plaintext must be between {} and {} bytes, got {}",
            MIN_PLAINTEXT_SIZE, MAX_PLAINTEXT_SIZE, len
        )));
    }

    let mut padded = vec![0u8; 2 + calc_padded_len(len)];
    padded[0..2].copy_from_slice(&(len as u16).to_be_bytes());
    padded[2..2 + len].copy_from_slice(plaintext);
    Ok(padded)
}

/// Strip the length frame, rejecting any disagreement between the declared
/// length and the buffer actually received.
fn unpad(padded: &[u8]) -> Result<Vec<u8>> {
    if padded.len() < 2 {
        return Err(Error::InvalidPadding("Missing length prefix".into()));
    }

    let declared = u16::from_be_bytes([padded[0], padded[1]]) as usize;
    if declared < MIN_PLAINTEXT_SIZE {
        return Err(Error::InvalidPadding("Declared length is zero".into()));
    }
    if padded.len() != 2 + calc_padded_len(declared) {
        return Err(Error::InvalidPadding(format!(
            "Declared length {} does not fit a {}-byte buffer",
            declared,
            padded.len()
        )));
    }

    Ok(padded[2..2 + declared].to_vec())
}

// ============================================================================
// ENCRYPT / DECRYPT
// ============================================================================

/// Encrypt a plaintext under a conversation key with a random nonce.
///
/// Returns the base64 transport form of the envelope.
pub fn encrypt(plaintext: &[u8], conversation_key: &ConversationKey) -> Result<String> {
    encrypt_with_nonce(plaintext, conversation_key, &Nonce::random())
}

/// Encrypt with a caller-supplied nonce.
///
/// Deterministic: the same (plaintext, key, nonce) triple always yields the
/// same envelope. The nonce must never repeat for two different plaintexts
/// under one conversation key.
pub fn encrypt_with_nonce(
    plaintext: &[u8],
    conversation_key: &ConversationKey,
    nonce: &Nonce,
) -> Result<String> {
    let keys = MessageKeys::expand(conversation_key, nonce.as_bytes())?;

    let mut buffer = pad(plaintext)?;
    let mut cipher = ChaCha20::new(&keys.chacha_key.into(), &keys.chacha_nonce.into());
    cipher.apply_keystream(&mut buffer);

    let mac = hmac_with_aad(&keys.hmac_key, nonce.as_bytes(), &buffer)?;

    let mut payload = Vec::with_capacity(HEADER_SIZE + buffer.len() + MAC_SIZE);
    payload.push(VERSION);
    payload.extend_from_slice(nonce.as_bytes());
    payload.extend_from_slice(&buffer);
    payload.extend_from_slice(&mac);

    Ok(BASE64.encode(payload))
}

/// Decrypt a base64 envelope under a conversation key.
///
/// The MAC is verified in constant time before any decryption is attempted;
/// a tampered envelope fails with [`Error::InvalidMac`] and nothing else.
pub fn decrypt(payload: &str, conversation_key: &ConversationKey) -> Result<Vec<u8>> {
    // '#' marks envelopes from optional future encodings
    if payload.starts_with('#') {
        return Err(Error::UnsupportedVersion("unversioned future format".into()));
    }

    let data = BASE64
        .decode(payload)
        .map_err(|e| Error::InvalidEncoding(format!("Invalid base64: {}", e)))?;

    if data.len() < MIN_PAYLOAD_SIZE || data.len() > MAX_PAYLOAD_SIZE {
        return Err(Error::InvalidSize(format!(
            "Payload must be between {} and {} bytes, got {}",
            MIN_PAYLOAD_SIZE,
            MAX_PAYLOAD_SIZE,
            data.len()
        )));
    }

    let version = data[0];
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version.to_string()));
    }

    let nonce = &data[1..HEADER_SIZE];
    let ciphertext = &data[HEADER_SIZE..data.len() - MAC_SIZE];
    let mac = &data[data.len() - MAC_SIZE..];

    let keys = MessageKeys::expand(conversation_key, nonce)?;

    let mut verifier = HmacSha256::new_from_slice(&keys.hmac_key)
        .map_err(|e| Error::InvalidLength(format!("HMAC key init failed: {}", e)))?;
    verifier.update(nonce);
    verifier.update(ciphertext);
    verifier.verify_slice(mac).map_err(|_| Error::InvalidMac)?;

    let mut buffer = ciphertext.to_vec();
    let mut cipher = ChaCha20::new(&keys.chacha_key.into(), &keys.chacha_nonce.into());
    cipher.apply_keystream(&mut buffer);

    unpad(&buffer)
}

/// HMAC-SHA256 with the envelope nonce bound in as associated data.
///
/// Fails with [`Error::InvalidAad`] unless the associated data is exactly the
/// 32-byte nonce.
fn hmac_with_aad(key: &[u8; 32], aad: &[u8], message: &[u8]) -> Result<[u8; MAC_SIZE]> {
    if aad.len() != NONCE_SIZE {
        return Err(Error::InvalidAad(format!(
            "AAD must be the {}-byte nonce, got {} bytes",
            NONCE_SIZE,
            aad.len()
        )));
    }

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::InvalidLength(format!("HMAC key init failed: {}", e)))?;
    mac.update(aad);
    mac.update(message);

    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

// ============================================================================
// TESTS
// ============================================================================
