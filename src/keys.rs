//! # Key Management
//!
//! secp256k1 key material for event authorship and conversation keys.
//!
//! Two text forms are accepted everywhere a key can be supplied:
//!
//! - raw hex: 64 lowercase hex characters (32 bytes)
//! - bech32: `nsec1...` for secret keys, `npub1...` for public keys
//!
//! Both normalize to the same raw 32-byte value before use. Public keys are
//! x-only: the 32-byte x-coordinate of the curve point, with the even-y
//! compression convention applied whenever the full point is needed (a
//! protocol convention, not a general key format; see
//! [`PublicKey::to_even_point`]).

use bech32::{FromBase32, ToBase32, Variant};
use rand::rngs::OsRng;
use secp256k1::{Keypair, Parity, Secp256k1, SecretKey, XOnlyPublicKey};
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Size of a secret key in bytes
pub const SECRET_KEY_SIZE: usize = 32;

/// Size of an x-only public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Bech32 human-readable part for secret keys
pub const SECRET_KEY_HRP: &str = "nsec";

/// Bech32 human-readable part for public keys
pub const PUBLIC_KEY_HRP: &str = "npub";

// ============================================================================
// PUBLIC KEY
// ============================================================================

/// An x-only secp256k1 public key (32 bytes)
///
/// This is the identity attached to every event. Safe to share, display,
/// serialize, and compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey(XOnlyPublicKey);

impl PublicKey {
    /// Parse from either raw hex or a bech32 `npub` string
    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with(PUBLIC_KEY_HRP) {
            Self::from_bech32(input)
        } else {
            Self::from_hex(input)
        }
    }

    /// Decode from 64 hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::InvalidKey(format!("Invalid public key hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Decode from a bech32 `npub1...` string
    pub fn from_bech32(s: &str) -> Result<Self> {
        let bytes = decode_bech32(PUBLIC_KEY_HRP, s)?;
        Self::from_slice(&bytes)
    }

    /// Create from a 32-byte x-coordinate
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(Error::InvalidKey(format!(
                "Public key must be {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )));
        }
        let key = XOnlyPublicKey::from_slice(bytes)
            .map_err(|e| Error::InvalidKey(format!("Invalid public key: {}", e)))?;
        Ok(Self(key))
    }

    /// Get the raw 32-byte x-coordinate
    pub fn serialize(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.serialize()
    }

    /// Encode as 64 hex characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Encode as a bech32 `npub1...` string
    pub fn to_bech32(&self) -> Result<String> {
        encode_bech32(PUBLIC_KEY_HRP, &self.serialize())
    }

    /// Get the underlying x-only key
    pub(crate) fn x_only(&self) -> &XOnlyPublicKey {
        &self.0
    }

    /// Restore the full curve point, assuming an even y-coordinate.
    ///
    /// Only the x-coordinate travels on the wire; the even-y prefix is fixed
    /// by protocol convention so both sides rebuild the same point for ECDH.
    pub(crate) fn to_even_point(&self) -> secp256k1::PublicKey {
        secp256k1::PublicKey::from_x_only_public_key(self.0, Parity::Even)
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ============================================================================
// KEYS
// ============================================================================

/// A secp256k1 keypair: the caller's identity or a single-use wrap key
///
/// The secret scalar stays inside this struct; operations that need it
/// (signing, conversation-key derivation) borrow it through crate-internal
/// accessors rather than copying it out.
pub struct Keys {
    keypair: Keypair,
    public: PublicKey,
}

impl Keys {
    /// Generate a fresh random keypair
    ///
    /// Uses the operating system's secure random number generator. This is
    /// also how single-use gift-wrap keys are made: generated, used for one
    /// envelope, dropped.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let secret = SecretKey::new(&mut OsRng);
        let keypair = Keypair::from_secret_key(&secp, &secret);
        Self::from_keypair(keypair)
    }

    /// Parse from either raw hex or a bech32 `nsec` string
    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with(SECRET_KEY_HRP) {
            let mut bytes = decode_bech32(SECRET_KEY_HRP, input)?;
            let keys = Self::from_secret_bytes(&bytes);
            bytes.zeroize();
            keys
        } else {
            let mut bytes = hex::decode(input)
                .map_err(|e| Error::InvalidKey(format!("Invalid secret key hex: {}", e)))?;
            let keys = Self::from_secret_bytes(&bytes);
            bytes.zeroize();
            keys
        }
    }

    /// Create from a raw 32-byte secret scalar
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(Error::InvalidKey(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            )));
        }
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| Error::InvalidKey(format!("Invalid secret key: {}", e)))?;
        let secp = Secp256k1::new();
        let keypair = Keypair::from_secret_key(&secp, &secret);
        Ok(Self::from_keypair(keypair))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        let (xonly, _parity) = XOnlyPublicKey::from_keypair(&keypair);
        Self {
            keypair,
            public: PublicKey(xonly),
        }
    }

    /// Get the x-only public key for this keypair
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Get the secret key bytes (for backup/storage)
    ///
    /// ## Security Warning
    ///
    /// Only use this for secure storage. Never log or transmit these bytes.
    pub fn secret_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.keypair.secret_key().secret_bytes()
    }

    /// Encode the secret key as a bech32 `nsec1...` string
    pub fn to_bech32(&self) -> Result<String> {
        let mut bytes = self.secret_bytes();
        let encoded = encode_bech32(SECRET_KEY_HRP, &bytes);
        bytes.zeroize();
        encoded
    }

    /// Borrow the secret scalar for ECDH
    pub(crate) fn secret_key(&self) -> SecretKey {
        self.keypair.secret_key()
    }

    /// Borrow the keypair for Schnorr signing
    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret scalar
        f.debug_struct("Keys").field("public", &self.public).finish()
    }
}

// ============================================================================
// BECH32 HELPERS
// ============================================================================

fn encode_bech32(hrp: &str, bytes: &[u8]) -> Result<String> {
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|e| Error::InvalidKey(format!("bech32 encoding failed: {}", e)))
}

fn decode_bech32(expected_hrp: &str, s: &str) -> Result<Vec<u8>> {
    let (hrp, data, variant) =
        bech32::decode(s).map_err(|e| Error::InvalidKey(format!("bech32 decoding failed: {}", e)))?;
    if hrp != expected_hrp {
        return Err(Error::InvalidKey(format!(
            "Expected bech32 prefix '{}', got '{}'",
            expected_hrp, hrp
        )));
    }
    if variant != Variant::Bech32 {
        return Err(Error::InvalidKey("Expected bech32 variant, got bech32m".into()));
    }
    Vec::<u8>::from_base32(&data)
        .map_err(|e| Error::InvalidKey(format!("bech32 base32 conversion failed: {}", e)))
}

// ============================================================================
// TESTS
// ============================================================================
