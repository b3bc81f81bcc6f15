//! Core data model: references, certificates and session states.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where to fetch a certificate from, and the key to open it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateReference {
    /// Location of the (possibly encrypted) document.
    pub uri: String,
    /// Hex key for encrypted documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl CertificateReference {
    /// Create a reference without a key.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            key: None,
        }
    }

    /// Attach a decryption key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A decrypted, normalized certificate document.
///
/// The document is opaque JSON; the verification engine interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certificate(Value);

impl Certificate {
    /// Wrap a JSON document.
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Borrow the raw document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the raw document.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Certificate {
    fn from(document: Value) -> Self {
        Self(document)
    }
}

/// Lifecycle of a retrieval, send or share action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Request in flight.
    Pending,
    /// Completed successfully.
    Success,
    /// Completed with an error.
    Failure,
}

/// Display states the navigator can be asked to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Certificate viewer, shown after successful verification.
    Viewer,
}

impl Route {
    /// Path of the route.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Viewer => "/viewer",
        }
    }
}
