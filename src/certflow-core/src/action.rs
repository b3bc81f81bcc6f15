//! Incoming action requests.
//!
//! Links into the viewer carry a JSON action in the query string:
//!
//! ```text
//! { "type": "DOCUMENT", "payload": { "uri": "...", "key": "...", "permittedActions": [...] } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActionError;
use crate::types::CertificateReference;

/// The only action type that loads a certificate.
pub const DOCUMENT_ACTION: &str = "DOCUMENT";

/// Payload of a document action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    /// Location of the document.
    pub uri: String,
    /// Hex key for encrypted documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Actions the viewer may offer (e.g. `"VIEW"`, `"STORE"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permitted_actions: Vec<String>,
    /// Where the viewer should send the user afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// A parsed action request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Action type.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Action payload.
    pub payload: ActionPayload,
}

impl ActionRequest {
    /// Parse and check an action value.
    pub fn from_value(value: &Value) -> Result<Self, ActionError> {
        // Unknown types are reported before payload shape errors.
        if let Some(action_type) = value.get("type").and_then(Value::as_str) {
            if action_type != DOCUMENT_ACTION {
                return Err(ActionError::UnsupportedType {
                    action_type: action_type.to_string(),
                });
            }
        }

        let request: Self =
            serde_json::from_value(value.clone()).map_err(|e| ActionError::Malformed {
                message: e.to_string(),
            })?;

        if request.payload.uri.trim().is_empty() {
            return Err(ActionError::Malformed {
                message: "payload.uri is empty".into(),
            });
        }
        Ok(request)
    }

    /// The reference this action points at.
    pub fn reference(&self) -> CertificateReference {
        CertificateReference {
            uri: self.payload.uri.clone(),
            key: self.payload.key.clone(),
        }
    }
}

impl CertificateReference {
    /// Build a reference from an action value.
    pub fn from_action(value: &Value) -> Result<Self, ActionError> {
        ActionRequest::from_value(value).map(|request| request.reference())
    }

    /// Build a reference from a raw action string.
    pub fn from_action_str(raw: &str) -> Result<Self, ActionError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| ActionError::Malformed {
            message: e.to_string(),
        })?;
        Self::from_action(&value)
    }
}
