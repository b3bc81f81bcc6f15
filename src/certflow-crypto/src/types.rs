//! Envelope types shared by the codec and its callers.

use serde::{Deserialize, Serialize};

/// Envelope type tag for AES-256-GCM encrypted documents.
pub const OPEN_ATTESTATION_TYPE_1: &str = "OPEN-ATTESTATION-TYPE-1";

/// AES-256 key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// GCM nonce length in bytes (96 bits).
pub const IV_LENGTH: usize = 12;

/// GCM authentication tag length in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

/// A cipher-wrapped document as it travels over the wire.
///
/// Field names match the JSON envelope:
///
/// ```text
/// { "type": "OPEN-ATTESTATION-TYPE-1", "cipherText": "...", "iv": "...", "tag": "..." }
/// ```
///
/// `cipherText`, `iv` and `tag` are standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedDocument {
    /// Envelope type tag.
    #[serde(rename = "type")]
    pub encryption_type: String,
    /// Base64 ciphertext (without the tag).
    pub cipher_text: String,
    /// Base64 initialisation vector.
    pub iv: String,
    /// Base64 authentication tag.
    pub tag: String,
}

/// Output of [`crate::encrypt_string`]: the envelope plus the hex key needed
/// to open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionResult {
    /// The encrypted envelope.
    #[serde(flatten)]
    pub document: EncryptedDocument,
    /// Hex-encoded 256-bit key.
    pub key: String,
}
