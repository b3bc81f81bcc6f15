//! Verification orchestration.
//!
//! Submits a certificate to the verification engine, classifies the report
//! and drives the side effects:
//!
//! - valid → navigate to the viewer
//! - invalid → one analytics event per failing condition
//!
//! The engine is a black box. An engine failure is a [`VerificationError`],
//! never an invalid report.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

use crate::analytics::{emit_failure_events, AnalyticsSink};
use crate::classifier::{classify, CheckSummary, Classification};
use crate::error::VerificationError;
use crate::report::VerificationReport;
use crate::transport::HttpTransport;
use crate::types::{Certificate, Route};

/// Failure reported by a verification engine.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Engine message.
    pub message: String,
}

impl EngineError {
    /// Create an engine error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<EngineError> for VerificationError {
    fn from(e: EngineError) -> Self {
        VerificationError::new(e.message)
    }
}

/// Trait for the external verification engine.
#[async_trait]
pub trait VerificationEngine: Send + Sync {
    /// Run every verifier over the certificate.
    async fn verify(
        &self,
        certificate: &Certificate,
        network: &str,
    ) -> Result<VerificationReport, EngineError>;
}

/// Engine reached over HTTP.
///
/// Posts `{ document, network }` and expects the fragment array back.
pub struct HttpVerificationEngine {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
}

impl HttpVerificationEngine {
    /// Create an engine client for `endpoint`.
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VerificationEngine for HttpVerificationEngine {
    #[instrument(skip(self, certificate), fields(endpoint = %self.endpoint))]
    async fn verify(
        &self,
        certificate: &Certificate,
        network: &str,
    ) -> Result<VerificationReport, EngineError> {
        let body = json!({ "document": certificate, "network": network });
        let response = self
            .transport
            .post_json(&self.endpoint, &body)
            .await
            .map_err(|e| EngineError::new(e.message))?;

        if response.is_http_failure() {
            return Err(EngineError::new(format!(
                "Verifier returned HTTP {}",
                response.status
            )));
        }

        let value = response
            .parse_json()
            .map_err(|e| EngineError::new(format!("Invalid verifier response: {}", e)))?;
        serde_json::from_value(value)
            .map_err(|e| EngineError::new(format!("Invalid verification fragments: {}", e)))
    }
}

/// Trait for the navigation collaborator.
pub trait Navigator: Send + Sync {
    /// Move the user to a route.
    fn navigate(&self, route: Route);
}

/// Navigator that only logs the transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        info!(route = route.path(), "Navigate");
    }
}

/// A report and its classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Engine report.
    pub report: VerificationReport,
    /// Classification of the report.
    pub classification: Classification,
}

impl VerificationOutcome {
    /// Whether the certificate passed every check.
    pub fn is_valid(&self) -> bool {
        self.classification.valid
    }
}

/// Runs the engine and the post-verification effects.
pub struct Verifier {
    engine: Arc<dyn VerificationEngine>,
    navigator: Arc<dyn Navigator>,
    analytics: Arc<dyn AnalyticsSink>,
    network: String,
    distinct_identity_code: bool,
}

impl Verifier {
    /// Create a verifier.
    pub fn new(
        engine: Arc<dyn VerificationEngine>,
        navigator: Arc<dyn Navigator>,
        analytics: Arc<dyn AnalyticsSink>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            navigator,
            analytics,
            network: network.into(),
            distinct_identity_code: false,
        }
    }

    /// Report identity failures with their own analytics code.
    #[must_use]
    pub fn with_distinct_identity_code(mut self, enabled: bool) -> Self {
        self.distinct_identity_code = enabled;
        self
    }

    /// Verify and classify, without side effects.
    #[instrument(skip(self, certificate), fields(network = %self.network))]
    pub async fn verify(
        &self,
        certificate: &Certificate,
    ) -> Result<VerificationOutcome, VerificationError> {
        let report = self
            .engine
            .verify(certificate, &self.network)
            .await
            .map_err(|e| {
                warn!(error = %e, "Verification engine failed");
                VerificationError::from(e)
            })?;

        trace!(report = ?report, "Verification report");

        let classification = classify(&report);
        debug!(
            valid = classification.valid,
            categories = ?classification.categories,
            "Verification classified"
        );

        Ok(VerificationOutcome {
            report,
            classification,
        })
    }

    /// Navigate on success, emit analytics on failure.
    pub fn dispatch_effects(&self, certificate: &Certificate, outcome: &VerificationOutcome) {
        if outcome.is_valid() {
            self.navigator.navigate(Route::Viewer);
            return;
        }

        let summary = CheckSummary::evaluate(&outcome.report);
        let emitted = emit_failure_events(
            self.analytics.as_ref(),
            certificate,
            &summary,
            self.distinct_identity_code,
        );
        debug!(emitted, "Analytics events emitted");
    }
}
