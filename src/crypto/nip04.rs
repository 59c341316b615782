//! # Legacy Message Envelope (v1)
//!
//! The original direct-message cipher (NIP-04), kept only so existing
//! deployed content stays readable. New content always uses the v2 envelope.
//!
//! ## Construction
//!
//! - Key: the raw ECDH x-coordinate, used directly as the AES-256 key.
//!   No extract step. This asymmetry with the v2 envelope is deliberate and
//!   must not be "fixed", or old ciphertexts stop decrypting.
//! - Cipher: AES-256-CBC with a random 16-byte IV and PKCS#7 padding.
//! - Transport form: `base64(ciphertext) + "?iv=" + base64(iv)`.
//!
//! There is no authentication tag: the envelope is malleable and leaks exact
//! plaintext block counts. Decrypt-only use is the expectation; the encrypt
//! path exists for interoperability tests and nothing else in this crate
//! calls it.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use zeroize::Zeroize;

use crate::crypto::conversation::shared_secret_x;
use crate::error::{Error, Result};
use crate::keys::{Keys, PublicKey};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Size of the CBC initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// AES block size in bytes
const BLOCK_SIZE: usize = 16;

/// Separator between the ciphertext and IV segments of the transport form
const IV_SEPARATOR: &str = "?iv=";

/// Encrypt a plaintext for `their_public` in the legacy envelope format.
pub fn encrypt(keys: &Keys, their_public: &PublicKey, plaintext: &[u8]) -> Result<String> {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    encrypt_with_iv(keys, their_public, plaintext, &iv)
}

/// Encrypt with a caller-supplied IV. Deterministic; test use only.
fn encrypt_with_iv(
    keys: &Keys,
    their_public: &PublicKey,
    plaintext: &[u8],
    iv: &[u8; IV_SIZE],
) -> Result<String> {
    let mut key = shared_secret_x(keys, their_public);
    let ciphertext = Aes256CbcEnc::new(&key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    key.zeroize();

    Ok(format!(
        "{}{}{}",
        BASE64.encode(ciphertext),
        IV_SEPARATOR,
        BASE64.encode(iv)
    ))
}

/// Decrypt a legacy envelope received from `their_public`.
///
/// Fails with [`Error::InvalidFormat`] when the `?iv=` separator is missing
/// or either segment is not decodable, and with [`Error::DecryptionFailed`]
/// when the block cipher rejects the ciphertext.
pub fn decrypt(keys: &Keys, their_public: &PublicKey, payload: &str) -> Result<Vec<u8>> {
    let (ciphertext_b64, iv_b64) = payload
        .split_once(IV_SEPARATOR)
        .ok_or_else(|| Error::InvalidFormat("Missing '?iv=' separator".into()))?;

    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|e| Error::InvalidFormat(format!("Invalid ciphertext base64: {}", e)))?;
    let iv_bytes = BASE64
        .decode(iv_b64)
        .map_err(|e| Error::InvalidFormat(format!("Invalid IV base64: {}", e)))?;

    let iv: [u8; IV_SIZE] = iv_bytes
        .try_into()
        .map_err(|_| Error::InvalidFormat(format!("IV must be {} bytes", IV_SIZE)))?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::DecryptionFailed(
            "Ciphertext is not a whole number of blocks".into(),
        ));
    }

    let mut key = shared_secret_x(keys, their_public);
    let result = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| Error::DecryptionFailed("Bad block padding".into()));
    key.zeroize();

    result
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        let envelope = encrypt(&alice, &bob.public_key(), b"legacy hello").unwrap();
        let decrypted = decrypt(&bob, &alice.public_key(), &envelope).unwrap();

        assert_eq!(decrypted, b"legacy hello");
    }

    #[test]
    fn test_fixed_iv_is_deterministic() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let iv = [3u8; IV_SIZE];

        let a = encrypt_with_iv(&alice, &bob.public_key(), b"fixed", &iv).unwrap();
        let b = encrypt_with_iv(&alice, &bob.public_key(), b"fixed", &iv).unwrap();
        assert_eq!(a, b);

        assert_eq!(decrypt(&bob, &alice.public_key(), &a).unwrap(), b"fixed");
    }

    #[test]
    fn test_envelope_format() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        let envelope = encrypt(&alice, &bob.public_key(), b"shape check").unwrap();
        let (_, iv_b64) = envelope.split_once(IV_SEPARATOR).unwrap();
        assert_eq!(BASE64.decode(iv_b64).unwrap().len(), IV_SIZE);
    }

    #[test]
    fn test_missing_separator_rejected() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        let result = decrypt(&alice, &bob.public_key(), "bm8gc2VwYXJhdG9y");
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_bad_base64_segments_rejected() {
        let alice = Keys::generate();
        let bob = Keys::generate();
        let pk = bob.public_key();

        assert!(matches!(
            decrypt(&alice, &pk, "!!!not-base64!!!?iv=AAAAAAAAAAAAAAAAAAAAAA=="),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            decrypt(&alice, &pk, "AAAAAAAAAAAAAAAAAAAAAA==?iv=!!!not-base64!!!"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_wrong_iv_size_rejected() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        // 8-byte IV
        let payload = format!("AAAAAAAAAAAAAAAAAAAAAA=={}{}", IV_SEPARATOR, BASE64.encode([0u8; 8]));
        let result = decrypt(&alice, &bob.public_key(), &payload);
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_partial_block_rejected() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        let envelope = encrypt(&alice, &bob.public_key(), b"whole blocks only").unwrap();
        let (ct_b64, iv_b64) = envelope.split_once(IV_SEPARATOR).unwrap();

        // graft one extra byte onto the ciphertext
        let mut ct = BASE64.decode(ct_b64).unwrap();
        ct.push(0xaa);
        let tampered = format!("{}{}{}", BASE64.encode(ct), IV_SEPARATOR, iv_b64);

        let result = decrypt(&bob, &alice.public_key(), &tampered);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_key_is_commutative() {
        let alice = Keys::generate();
        let bob = Keys::generate();

        // either side can open what the other sealed
        let from_alice = encrypt(&alice, &bob.public_key(), b"ping").unwrap();
        let from_bob = encrypt(&bob, &alice.public_key(), b"pong").unwrap();

        assert_eq!(decrypt(&bob, &alice.public_key(), &from_alice).unwrap(), b"ping");
        assert_eq!(decrypt(&alice, &bob.public_key(), &from_bob).unwrap(), b"pong");
    }
}
