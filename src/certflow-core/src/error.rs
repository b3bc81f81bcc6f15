//! Error types for retrieval, verification and dispatch.
//!
//! Every stage has its own terminal error. [`CertflowError`] wraps them for
//! callers that drive the whole pipeline.

use certflow_crypto::CryptoError;
use thiserror::Error;

use crate::transport::TransportError;

/// Decryption failures surface with the codec's own error type.
pub type DecryptionError = CryptoError;

/// Errors that end a retrieval session.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The origin answered with a 4xx or 5xx status.
    #[error("Unable to load the certificate from {uri}")]
    HttpFailure {
        /// Requested URI.
        uri: String,
        /// HTTP status returned.
        status: u16,
    },

    /// The origin returned nothing usable.
    #[error("Certificate at address {uri} is empty")]
    EmptyDocument {
        /// Requested URI.
        uri: String,
    },

    /// A key was supplied without a matching encrypted type, or the payload
    /// declares a type this client cannot open.
    #[error(
        "Unable to decrypt certificate with key={} and type={}",
        .key.as_deref().unwrap_or("none"),
        .document_type.as_deref().unwrap_or("none")
    )]
    UndecipherableDocument {
        /// Key supplied with the reference.
        key: Option<String>,
        /// Type declared by the payload.
        document_type: Option<String>,
    },

    /// The encrypted envelope could not be opened.
    #[error("Decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    /// The body (or decrypted plaintext) is not valid JSON.
    #[error("Malformed certificate from {uri}: {reason}")]
    MalformedDocument {
        /// Requested URI.
        uri: String,
        /// Parser message.
        reason: String,
    },

    /// The request never produced a response.
    #[error("Request to {uri} failed: {reason}")]
    Transport {
        /// Requested URI.
        uri: String,
        /// Transport message.
        reason: String,
    },
}

/// The verification engine itself failed (as opposed to the certificate
/// failing its checks).
#[derive(Debug, Clone, Error)]
#[error("Verification errored: {message}")]
pub struct VerificationError {
    /// Engine message.
    pub message: String,
}

impl VerificationError {
    /// Create a verification error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from the send and share dispatchers.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Email dispatch needs a captcha token.
    #[error("A captcha token is required to send a certificate")]
    MissingCaptcha,

    /// No certificate is held by the session.
    #[error("No certificate loaded")]
    NoCertificate,

    /// A send is already pending; the new request was not dispatched.
    #[error("A previous send is still pending")]
    InFlight,

    /// The remote answered but the action did not succeed.
    #[error("{message}")]
    Rejected {
        /// Failure message.
        message: String,
    },

    /// The remote answered with something that is not JSON.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// Parser message.
        message: String,
    },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl DispatchError {
    /// Create a rejected error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Errors parsing an incoming action request.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action is not valid JSON or lacks required fields.
    #[error("Malformed action: {message}")]
    Malformed {
        /// Parser message.
        message: String,
    },

    /// The action type is not a document action.
    #[error("Unsupported action type: {action_type}")]
    UnsupportedType {
        /// The type found.
        action_type: String,
    },
}

/// Errors reading fields out of a wrapped certificate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrappedDocumentError {
    /// The document has no `data` section.
    #[error("Document has no data section")]
    MissingData,

    /// The document lists no issuers.
    #[error("Document has no issuers")]
    MissingIssuers,

    /// An issuer declares no store or registry address.
    #[error("Issuer {index} has no store address")]
    MissingIssuerAddress {
        /// Position of the issuer in the list.
        index: usize,
    },

    /// The document has no string `id`.
    #[error("Document has no id")]
    MissingId,
}

/// Top-level error for callers driving the whole pipeline.
#[derive(Debug, Error)]
pub enum CertflowError {
    /// Retrieval failed.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// The verification engine failed.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// A dispatcher failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// An action request could not be parsed.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Transport could not be constructed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Local encryption or decryption outside a retrieval.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A newer retrieval replaced this one before it completed.
    #[error("Session {sequence} was superseded by a newer retrieval")]
    Superseded {
        /// Sequence number of the discarded session.
        sequence: u64,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },
}

impl CertflowError {
    /// Check if this error came from the retrieval stage.
    #[must_use]
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(self, Self::Retrieval(_))
    }

    /// Check if the result was discarded because a newer session started.
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}
