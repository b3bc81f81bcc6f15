//! # certflow-crypto
//!
//! Symmetric document encryption for certflow.
//!
//! Certificates may be published as cipher-wrapped envelopes so that only
//! holders of the key (typically carried in a share link) can read them:
//!
//! ```text
//! {
//!   "type": "OPEN-ATTESTATION-TYPE-1",
//!   "cipherText": "<base64>",
//!   "iv": "<base64, 96 bits>",
//!   "tag": "<base64, 128 bits>"
//! }
//! ```
//!
//! The key is a hex-encoded 256-bit AES-GCM key and never travels inside
//! the envelope.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cipher;
mod error;
mod types;

pub use cipher::{decrypt_string, encrypt_string, generate_key, Decryptor, OpenAttestationDecryptor};
pub use error::CryptoError;
pub use types::{
    EncryptedDocument, EncryptionResult, IV_LENGTH, KEY_LENGTH, OPEN_ATTESTATION_TYPE_1,
    TAG_LENGTH,
};
