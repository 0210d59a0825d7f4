//! AES-GCM payload encryption for outbound API requests.
//!
//! Wire format: base64(IV (12 bytes) || Ciphertext || Auth Tag (16 bytes)).
//! The server decrypts with the same shared secret, so this layout must not
//! change.

use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit},
    Aes128Gcm, Aes256Gcm, AesGcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

type Aes192Gcm = AesGcm<aes::Aes192, U12>;

/// AES-GCM IV size in bytes (96 bits).
pub const IV_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

const MIN_ENVELOPE_SIZE: usize = IV_SIZE + TAG_SIZE;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("unsupported AES-GCM key length: {0} bytes (expected 16, 24 or 32)")]
    UnsupportedKeyLength(usize),
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("malformed encrypted envelope")]
    MalformedEnvelope,
}

/// How the shared secret string becomes AES key material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyDerivation {
    /// The UTF-8 bytes of the secret are the key. This is what the server
    /// expects. INSECURE: no KDF is applied.
    #[default]
    None,
    /// SHA-256 of the secret is used as an AES-256 key. Only for servers
    /// configured the same way.
    Sha256,
}

enum AeadKey {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl AeadKey {
    fn from_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::UnsupportedKeyLength(key.len());
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128).map_err(invalid),
            24 => Aes192Gcm::new_from_slice(key).map(Self::Aes192).map_err(invalid),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256).map_err(invalid),
            n => Err(CryptoError::UnsupportedKeyLength(n)),
        }
    }

    fn seal(&self, iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce: &Nonce<U12> = Nonce::from_slice(iv);
        let sealed = match self {
            Self::Aes128(c) => c.encrypt(nonce, plaintext),
            Self::Aes192(c) => c.encrypt(nonce, plaintext),
            Self::Aes256(c) => c.encrypt(nonce, plaintext),
        };
        sealed.map_err(|_| CryptoError::EncryptionFailed)
    }

    fn open(&self, iv: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce: &Nonce<U12> = Nonce::from_slice(iv);
        let opened = match self {
            Self::Aes128(c) => c.decrypt(nonce, sealed),
            Self::Aes192(c) => c.decrypt(nonce, sealed),
            Self::Aes256(c) => c.decrypt(nonce, sealed),
        };
        opened.map_err(|_| CryptoError::DecryptionFailed)
    }

    fn bits(&self) -> usize {
        match self {
            Self::Aes128(_) => 128,
            Self::Aes192(_) => 192,
            Self::Aes256(_) => 256,
        }
    }
}

/// Encrypts request payloads under one shared key.
///
/// The key schedule is built once; every call to [`PayloadCipher::encrypt`]
/// draws a fresh IV from the OS RNG.
pub struct PayloadCipher {
    key: AeadKey,
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher")
            .field("key", &format_args!("<AES-{}-GCM redacted>", self.key.bits()))
            .finish()
    }
}

impl PayloadCipher {
    /// Build a cipher from raw key bytes (16, 24 or 32 bytes).
    pub fn from_key(key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            key: AeadKey::from_bytes(key)?,
        })
    }

    /// Build a cipher from the configured shared secret string.
    pub fn from_secret(secret: &str, derivation: KeyDerivation) -> Result<Self, CryptoError> {
        match derivation {
            KeyDerivation::None => Self::from_key(secret.as_bytes()),
            KeyDerivation::Sha256 => {
                let digest = Zeroizing::new(Sha256::digest(secret.as_bytes()).to_vec());
                Self::from_key(&digest)
            }
        }
    }

    /// Encrypt `plaintext` and return base64(IV || ciphertext || tag).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let iv = generate_iv();
        // aes-gcm appends the tag to the ciphertext
        let sealed = self.key.seal(&iv, plaintext.as_bytes())?;

        let mut envelope = Vec::with_capacity(IV_SIZE + sealed.len());
        envelope.extend_from_slice(&iv);
        envelope.extend_from_slice(&sealed);
        Ok(STANDARD.encode(envelope))
    }

    /// Inverse of [`PayloadCipher::encrypt`], as the server performs it.
    ///
    /// The transport never decrypts (responses are plaintext). This exists
    /// for mock servers and for diagnosing payloads captured off the wire.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let envelope = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::MalformedEnvelope)?;
        if envelope.len() < MIN_ENVELOPE_SIZE {
            return Err(CryptoError::MalformedEnvelope);
        }

        let (iv, sealed) = envelope.split_at(IV_SIZE);
        let plaintext = self.key.open(iv, sealed)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }
}

/// Encrypt `plaintext` under raw `key` bytes.
pub fn encrypt_payload(plaintext: &str, key: &[u8]) -> Result<String, CryptoError> {
    PayloadCipher::from_key(key)?.encrypt(plaintext)
}

/// Generate a random 12-byte IV.
fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::{aead::AeadInPlace, Tag};

    const KEY_128: &[u8] = b"0123456789abcdef";
    const LOGIN: &str = r#"{"object":"authentication","action":"login","query":{"id":"u","pwd":"p"}}"#;

    fn decode(encoded: &str) -> Vec<u8> {
        STANDARD.decode(encoded).unwrap()
    }

    #[test]
    fn round_trip_for_every_key_size() {
        for key in [&b"k".repeat(16), &b"k".repeat(24), &b"k".repeat(32)] {
            let cipher = PayloadCipher::from_key(key).unwrap();
            let sealed = cipher.encrypt(LOGIN).unwrap();
            assert_eq!(cipher.decrypt(&sealed).unwrap(), LOGIN);
        }
    }

    #[test]
    fn round_trip_handles_multibyte_text() {
        let cipher = PayloadCipher::from_key(KEY_128).unwrap();
        let text = r#"{"comment":"결재 완료 ✓"}"#;
        let sealed = cipher.encrypt(text).unwrap();
        assert_eq!(decode(&sealed).len(), IV_SIZE + text.len() + TAG_SIZE);
        assert_eq!(cipher.decrypt(&sealed).unwrap(), text);
    }

    #[test]
    fn iv_is_fresh_per_call() {
        let cipher = PayloadCipher::from_key(KEY_128).unwrap();
        let a = decode(&cipher.encrypt(LOGIN).unwrap());
        let b = decode(&cipher.encrypt(LOGIN).unwrap());
        assert_ne!(a[..IV_SIZE], b[..IV_SIZE]);
        assert_ne!(a[IV_SIZE..], b[IV_SIZE..]);
    }

    #[test]
    fn layout_is_iv_then_ciphertext_then_tag() {
        let encoded = encrypt_payload(LOGIN, KEY_128).unwrap();
        let envelope = decode(&encoded);
        let (iv, rest) = envelope.split_at(IV_SIZE);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_SIZE);
        assert_eq!(ciphertext.len(), LOGIN.len());

        // Decrypt with an independently constructed detached-tag call.
        let cipher = Aes128Gcm::new_from_slice(KEY_128).unwrap();
        let mut buf = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(Nonce::from_slice(iv), b"", &mut buf, Tag::from_slice(tag))
            .unwrap();
        assert_eq!(buf, LOGIN.as_bytes());
    }

    #[test]
    fn login_envelope_length_with_derived_key() {
        let cipher = PayloadCipher::from_secret("testkey123", KeyDerivation::Sha256).unwrap();
        let encoded = cipher.encrypt(LOGIN).unwrap();
        assert_eq!(decode(&encoded).len(), 12 + LOGIN.len() + 16);
    }

    #[test]
    fn raw_secret_of_unsupported_length_is_rejected() {
        let err = PayloadCipher::from_secret("testkey123", KeyDerivation::None).unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedKeyLength(10)));
        assert!(encrypt_payload(LOGIN, b"short").is_err());
    }

    #[test]
    fn tampered_tag_is_detected() {
        let cipher = PayloadCipher::from_key(KEY_128).unwrap();
        let mut envelope = decode(&cipher.encrypt(LOGIN).unwrap());
        let last = envelope.len() - 1;
        envelope[last] ^= 0x01;
        let err = cipher.decrypt(&STANDARD.encode(envelope)).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn short_or_garbled_input_is_malformed() {
        let cipher = PayloadCipher::from_key(KEY_128).unwrap();
        assert!(matches!(
            cipher.decrypt(&STANDARD.encode([0u8; 27])),
            Err(CryptoError::MalformedEnvelope)
        ));
        assert!(matches!(
            cipher.decrypt("not base64!"),
            Err(CryptoError::MalformedEnvelope)
        ));
    }

    #[test]
    fn debug_output_redacts_key() {
        let cipher = PayloadCipher::from_key(KEY_128).unwrap();
        let shown = format!("{:?}", cipher);
        assert!(shown.contains("AES-128-GCM"));
        assert!(!shown.contains("0123456789abcdef"));
    }
}
