//! Certificate retrieval: fetch, unwrap, decrypt.
//!
//! ## Flow
//!
//! 1. GET the reference URI; a 4xx/5xx status fails before the body is read
//! 2. Parse the body as JSON and unwrap one `{ "document": ... }` envelope
//! 3. Resolve the payload kind once (see [`PayloadKind`])
//! 4. Decrypt if needed; the result is the certificate
//!
//! Nothing is cached. Every call re-fetches.

use std::sync::Arc;

use certflow_crypto::{Decryptor, EncryptedDocument, OPEN_ATTESTATION_TYPE_1};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::RetrievalError;
use crate::transport::HttpTransport;
use crate::types::{Certificate, CertificateReference};

/// What the unwrapped payload turned out to be, resolved once.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadKind {
    /// A plain document: no key and no declared type.
    Plain(Value),
    /// An encrypted envelope of the supported type, with a key to open it.
    Encrypted(EncryptedDocument),
    /// A key without a matching envelope, or a typed payload this client
    /// cannot open.
    Undecipherable {
        /// Key supplied with the reference.
        key: Option<String>,
        /// Type declared by the payload.
        document_type: Option<String>,
    },
}

impl PayloadKind {
    /// Classify an unwrapped payload against the reference key.
    ///
    /// An empty key counts as no key.
    pub fn resolve(payload: Value, key: Option<&str>) -> Self {
        let key = key.filter(|k| !k.is_empty());
        let document_type = declared_type(&payload);

        match (key, document_type.as_deref()) {
            (Some(_), Some(OPEN_ATTESTATION_TYPE_1)) => Self::Encrypted(envelope_fields(&payload)),
            (None, None) => Self::Plain(payload),
            _ => Self::Undecipherable {
                key: key.map(str::to_string),
                document_type,
            },
        }
    }
}

// null, false, 0 and "" stand for an absent field.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn declared_type(payload: &Value) -> Option<String> {
    match payload.get("type").filter(|t| !is_falsy(t))? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// Missing fields become empty strings and fail inside the codec.
fn envelope_fields(payload: &Value) -> EncryptedDocument {
    let field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    EncryptedDocument {
        encryption_type: field("type"),
        cipher_text: field("cipherText"),
        iv: field("iv"),
        tag: field("tag"),
    }
}

/// Remove one `{ "document": ... }` envelope if present.
///
/// A `document` field that is null, false, 0 or empty is not an envelope
/// and is left in place.
pub fn unwrap_envelope(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.get("document").is_some_and(|d| !is_falsy(d)) => {
            map.remove("document").unwrap_or(Value::Null)
        },
        other => other,
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Fetches and opens certificates.
pub struct Retriever {
    transport: Arc<dyn HttpTransport>,
    decryptor: Arc<dyn Decryptor>,
}

impl Retriever {
    /// Create a retriever.
    pub fn new(transport: Arc<dyn HttpTransport>, decryptor: Arc<dyn Decryptor>) -> Self {
        Self {
            transport,
            decryptor,
        }
    }

    /// Retrieve the certificate a reference points to.
    #[instrument(
        skip_all,
        fields(uri = %reference.uri, has_key = reference.key.as_deref().is_some_and(|k| !k.is_empty()))
    )]
    pub async fn retrieve(
        &self,
        reference: &CertificateReference,
    ) -> Result<Certificate, RetrievalError> {
        let uri = &reference.uri;
        debug!("Retrieval: fetching certificate");

        let response = self.transport.get(uri).await.map_err(|e| {
            warn!(error = %e, "Retrieval: request failed");
            RetrievalError::Transport {
                uri: uri.clone(),
                reason: e.message,
            }
        })?;

        if response.is_http_failure() {
            warn!(status = response.status, "Retrieval: origin returned an error status");
            return Err(RetrievalError::HttpFailure {
                uri: uri.clone(),
                status: response.status,
            });
        }

        if response.is_empty() {
            return Err(RetrievalError::EmptyDocument { uri: uri.clone() });
        }

        let body = response
            .parse_json()
            .map_err(|e| RetrievalError::MalformedDocument {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;

        let payload = unwrap_envelope(body);
        if is_empty_document(&payload) {
            return Err(RetrievalError::EmptyDocument { uri: uri.clone() });
        }

        let certificate = match PayloadKind::resolve(payload, reference.key.as_deref()) {
            PayloadKind::Plain(document) => document,
            PayloadKind::Encrypted(envelope) => {
                // resolve() only yields Encrypted when a key is present
                let key = reference.key.as_deref().unwrap_or_default();
                let plaintext = self.decryptor.decrypt(&envelope, key)?;
                debug!("Retrieval: certificate decrypted");
                serde_json::from_str(&plaintext).map_err(|e| {
                    RetrievalError::MalformedDocument {
                        uri: uri.clone(),
                        reason: format!("decrypted document is not JSON: {}", e),
                    }
                })?
            },
            PayloadKind::Undecipherable { key, document_type } => {
                warn!(document_type = ?document_type, "Retrieval: undecipherable document");
                return Err(RetrievalError::UndecipherableDocument { key, document_type });
            },
        };

        info!("Retrieval: certificate loaded");
        Ok(Certificate::new(certificate))
    }
}
