//! One-shot outbound actions on a held certificate.
//!
//! Both dispatchers are stateless. Suppressing concurrent sends is the
//! session's job.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::saturating_millis;
use crate::error::DispatchError;
use crate::transport::HttpTransport;
use crate::types::{Certificate, CertificateReference};

/// Emails a certificate to a recipient.
pub struct EmailDispatcher {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
}

impl EmailDispatcher {
    /// Create an email dispatcher for `endpoint`.
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Send a certificate. Returns whether the backend accepted it.
    ///
    /// Only a `200` counts as accepted; any other status is `false`.
    #[instrument(skip(self, certificate, email, captcha), fields(endpoint = %self.endpoint))]
    pub async fn send(
        &self,
        certificate: &Certificate,
        email: &str,
        captcha: &str,
    ) -> Result<bool, DispatchError> {
        if captcha.is_empty() {
            return Err(DispatchError::MissingCaptcha);
        }

        let body = json!({
            "data": certificate,
            "to": email,
            "captcha": captcha,
        });
        let response = self.transport.post_json(&self.endpoint, &body).await?;

        let accepted = response.status == 200;
        if accepted {
            info!("Certificate sent");
        } else {
            warn!(status = response.status, "Email backend did not accept certificate");
        }
        Ok(accepted)
    }
}

/// Stores a certificate and returns a share link.
pub struct ShareDispatcher {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    ttl: Duration,
}

impl ShareDispatcher {
    /// Create a share dispatcher for `endpoint` with a link lifetime.
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: impl Into<String>, ttl: Duration) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            ttl,
        }
    }

    /// Store the certificate and return whatever the backend answered.
    ///
    /// The status code is not checked; a body that is not JSON is an error.
    #[instrument(skip(self, certificate), fields(endpoint = %self.endpoint))]
    pub async fn share(&self, certificate: &Certificate) -> Result<ShareLink, DispatchError> {
        let ttl_ms = saturating_millis(self.ttl);
        let body = json!({
            "ttl": ttl_ms,
            "document": certificate,
        });
        let uri = format!("{}/", self.endpoint.trim_end_matches('/'));

        let response = self.transport.post_json(&uri, &body).await?;
        debug!(status = response.status, "Share backend answered");

        let value = response
            .parse_json()
            .map_err(|e| DispatchError::MalformedResponse {
                message: e.to_string(),
            })?;
        Ok(ShareLink(value))
    }
}

/// Share backend response, kept verbatim.
///
/// Normally `{ "id": ..., "key": ... }`, but nothing is guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareLink(Value);

impl ShareLink {
    /// Wrap a backend response.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Stored document id, if present.
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// Decryption key, if present.
    pub fn key(&self) -> Option<&str> {
        self.0.get("key").and_then(Value::as_str)
    }

    /// Raw response.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The backend answered `null`.
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Reference that resolves this link through normal retrieval.
    pub fn reference(&self, share_api: &str) -> Option<CertificateReference> {
        let id = self.id().filter(|id| !id.is_empty())?;
        let mut reference =
            CertificateReference::new(format!("{}/{}", share_api.trim_end_matches('/'), id));
        reference.key = self.key().map(str::to_string);
        Some(reference)
    }
}
