//! HTTP transport used for retrieval, dispatch and remote verification.
//!
//! Everything above this module only sees [`HttpTransport`]: a status code
//! and a body. Timeouts, TLS and connection pooling belong to the concrete
//! transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// A request that never produced a response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Error message.
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Status and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a response with a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Client or server error (status in `[400, 600)`).
    pub fn is_http_failure(&self) -> bool {
        (400..600).contains(&self.status)
    }

    /// True when the body is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Parse the body as JSON.
    pub fn parse_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Trait for the HTTP collaborator.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request.
    async fn get(&self, uri: &str) -> Result<HttpResponse, TransportError>;

    /// POST a JSON body, accepting JSON back.
    async fn post_json(&self, uri: &str, body: &Value) -> Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(format!("certflow/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::new(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn collect(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(format!("Failed to read body: {}", e)))?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self))]
    async fn get(&self, uri: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(uri).send().await.map_err(|e| {
            warn!(uri = %uri, error = %e, "HTTP GET failed");
            TransportError::new(format!("Request to {} failed: {}", uri, e))
        })?;

        debug!(uri = %uri, status = %response.status(), "HTTP GET response received");
        Self::collect(response).await
    }

    #[instrument(skip(self, body))]
    async fn post_json(&self, uri: &str, body: &Value) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(uri)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(uri = %uri, error = %e, "HTTP POST failed");
                TransportError::new(format!("Request to {} failed: {}", uri, e))
            })?;

        debug!(uri = %uri, status = %response.status(), "HTTP POST response received");
        Self::collect(response).await
    }
}
