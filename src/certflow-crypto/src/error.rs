//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur while encrypting or decrypting a document.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The envelope declares an encryption type this codec does not handle.
    #[error("Expecting version {expected} but got {found}")]
    UnsupportedType {
        /// The type this codec handles.
        expected: &'static str,
        /// The type found on the envelope.
        found: String,
    },

    /// Invalid symmetric key format or length.
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Reason the key is invalid.
        reason: String,
    },

    /// An envelope field could not be decoded.
    #[error("Invalid {field}: {reason}")]
    InvalidEncoding {
        /// Name of the offending envelope field.
        field: &'static str,
        /// Reason the field is invalid.
        reason: String,
    },

    /// Authenticated decryption failed (wrong key or tampered ciphertext).
    #[error("Error decrypting message")]
    AuthenticationFailed,

    /// Decryption succeeded but the recovered plaintext is unusable.
    #[error("Malformed plaintext: {reason}")]
    MalformedPlaintext {
        /// Reason the plaintext is malformed.
        reason: String,
    },

    /// Encryption failed.
    #[error("Encryption failed: {reason}")]
    EncryptionFailed {
        /// Reason for the failure.
        reason: String,
    },
}

impl CryptoError {
    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Create an invalid encoding error for the given envelope field.
    #[must_use]
    pub fn invalid_encoding(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            field,
            reason: reason.into(),
        }
    }

    /// Create a malformed plaintext error.
    #[must_use]
    pub fn malformed_plaintext(reason: impl Into<String>) -> Self {
        Self::MalformedPlaintext {
            reason: reason.into(),
        }
    }
}
