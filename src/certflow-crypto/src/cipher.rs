//! AES-256-GCM document codec.
//!
//! Encryption works in three layers:
//!
//! 1. The UTF-8 document is base64-encoded
//! 2. The base64 text is sealed with AES-256-GCM under a random 96-bit IV
//! 3. Ciphertext, IV and tag are each base64-encoded into the envelope
//!
//! Decryption reverses the layers and fails closed on any malformed field.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::CryptoError;
use crate::types::{
    EncryptedDocument, EncryptionResult, IV_LENGTH, KEY_LENGTH, OPEN_ATTESTATION_TYPE_1,
    TAG_LENGTH,
};

/// Trait for symmetric document decryption.
///
/// Retrieval holds a `dyn Decryptor` so the concrete cipher can be swapped
/// out in tests or by embedders.
pub trait Decryptor: Send + Sync {
    /// Decrypt an envelope with the given key, returning the plaintext document.
    fn decrypt(&self, document: &EncryptedDocument, key: &str) -> Result<String, CryptoError>;
}

/// Decryptor for `OPEN-ATTESTATION-TYPE-1` envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAttestationDecryptor;

impl OpenAttestationDecryptor {
    /// Create a new decryptor.
    pub fn new() -> Self {
        Self
    }
}

impl Decryptor for OpenAttestationDecryptor {
    fn decrypt(&self, document: &EncryptedDocument, key: &str) -> Result<String, CryptoError> {
        decrypt_string(document, key)
    }
}

/// Generate a random hex-encoded 256-bit key.
#[must_use]
pub fn generate_key() -> String {
    hex::encode(Aes256Gcm::generate_key(&mut OsRng))
}

/// Encrypt a document, generating a key when none is supplied.
pub fn encrypt_string(document: &str, key: Option<&str>) -> Result<EncryptionResult, CryptoError> {
    let key = key.map_or_else(generate_key, str::to_string);
    let cipher = cipher_for(&key)?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let encoded = BASE64.encode(document.as_bytes());
    let mut sealed = cipher
        .encrypt(&nonce, encoded.as_bytes())
        .map_err(|e| CryptoError::EncryptionFailed {
            reason: e.to_string(),
        })?;

    // aes-gcm appends the tag to the ciphertext; the envelope stores it apart
    let tag = sealed.split_off(sealed.len() - TAG_LENGTH);

    Ok(EncryptionResult {
        document: EncryptedDocument {
            encryption_type: OPEN_ATTESTATION_TYPE_1.to_string(),
            cipher_text: BASE64.encode(&sealed),
            iv: BASE64.encode(nonce),
            tag: BASE64.encode(tag),
        },
        key,
    })
}

/// Decrypt an `OPEN-ATTESTATION-TYPE-1` envelope.
pub fn decrypt_string(document: &EncryptedDocument, key: &str) -> Result<String, CryptoError> {
    if document.encryption_type != OPEN_ATTESTATION_TYPE_1 {
        return Err(CryptoError::UnsupportedType {
            expected: OPEN_ATTESTATION_TYPE_1,
            found: document.encryption_type.clone(),
        });
    }

    let cipher = cipher_for(key)?;
    let iv = decode_field("iv", &document.iv, Some(IV_LENGTH))?;
    let tag = decode_field("tag", &document.tag, Some(TAG_LENGTH))?;
    let mut sealed = decode_field("cipherText", &document.cipher_text, None)?;
    sealed.extend_from_slice(&tag);

    let encoded = cipher
        .decrypt(Nonce::from_slice(&iv), sealed.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let plaintext = BASE64
        .decode(&encoded)
        .map_err(|e| CryptoError::malformed_plaintext(format!("not base64: {}", e)))?;

    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::malformed_plaintext(format!("not UTF-8: {}", e)))
}

fn cipher_for(key: &str) -> Result<Aes256Gcm, CryptoError> {
    let key_bytes =
        hex::decode(key).map_err(|e| CryptoError::invalid_key(format!("not hex: {}", e)))?;
    if key_bytes.len() != KEY_LENGTH {
        return Err(CryptoError::invalid_key(format!(
            "expected {} bytes, got {}",
            KEY_LENGTH,
            key_bytes.len()
        )));
    }
    Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| CryptoError::invalid_key(e.to_string()))
}

fn decode_field(
    field: &'static str,
    value: &str,
    expected_len: Option<usize>,
) -> Result<Vec<u8>, CryptoError> {
    let bytes = BASE64
        .decode(value)
        .map_err(|e| CryptoError::invalid_encoding(field, e.to_string()))?;

    if let Some(expected) = expected_len {
        if bytes.len() != expected {
            return Err(CryptoError::invalid_encoding(
                field,
                format!("expected {} bytes, got {}", expected, bytes.len()),
            ));
        }
    }

    Ok(bytes)
}
