//! Best-effort analytics for failed verifications.
//!
//! Each failing condition produces one event:
//!
//! ```text
//! { category: "CERTIFICATE_ERROR", action: "<store>,<store>", label: "<document id>", value: <code> }
//! ```
//!
//! Analytics never affects the verification flow. If the certificate does
//! not expose store addresses and an id, nothing is emitted.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::CheckSummary;
use crate::types::Certificate;

/// Event category for verification failures.
pub const CERTIFICATE_ERROR_CATEGORY: &str = "CERTIFICATE_ERROR";

/// Numeric codes carried in the event `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Issuer identity could not be confirmed.
    IssuerIdentity = 0,
    /// Document hash mismatch.
    CertificateHash = 1,
    /// Document was never issued.
    UnissuedCertificate = 2,
    /// Document was revoked.
    RevokedCertificate = 3,
    /// Document store could not be read.
    CertificateStore = 4,
}

impl ErrorCode {
    /// Wire value.
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Failure conditions that trigger analytics, independent of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsCondition {
    /// Integrity check failed.
    HashMismatch,
    /// Status failed because the document was never issued.
    NotIssued,
    /// Status failed for any other reason.
    StoreFailure,
    /// Revocation check failed.
    Revoked,
    /// Identity check failed.
    IssuerIdentity,
}

impl AnalyticsCondition {
    /// Every condition that fires for a summary, in emission order.
    pub fn firing(summary: &CheckSummary) -> Vec<Self> {
        let mut conditions = Vec::new();
        if !summary.integrity {
            conditions.push(Self::HashMismatch);
        }
        if !summary.issued && summary.not_yet_issued {
            conditions.push(Self::NotIssued);
        }
        if !summary.issued && !summary.not_yet_issued {
            conditions.push(Self::StoreFailure);
        }
        if !summary.not_revoked {
            conditions.push(Self::Revoked);
        }
        if !summary.identity {
            conditions.push(Self::IssuerIdentity);
        }
        conditions
    }

    /// Code reported for this condition.
    ///
    /// Identity failures are reported with the unissued-certificate code
    /// unless `distinct_identity_code` is set.
    pub fn code(self, distinct_identity_code: bool) -> ErrorCode {
        match self {
            Self::HashMismatch => ErrorCode::CertificateHash,
            Self::NotIssued => ErrorCode::UnissuedCertificate,
            Self::StoreFailure => ErrorCode::CertificateStore,
            Self::Revoked => ErrorCode::RevokedCertificate,
            Self::IssuerIdentity if distinct_identity_code => ErrorCode::IssuerIdentity,
            Self::IssuerIdentity => ErrorCode::UnissuedCertificate,
        }
    }
}

/// One analytics event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Event category.
    pub category: String,
    /// Comma-separated issuer store addresses.
    pub action: String,
    /// Document id.
    pub label: String,
    /// Numeric error code.
    pub value: u8,
}

/// Certificate fields attached to every error event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsDetails {
    /// Comma-separated issuer store addresses.
    pub store_addresses: String,
    /// Document id.
    pub id: String,
}

impl AnalyticsDetails {
    /// Derive details from a certificate, or `None` if it lacks them.
    pub fn from_certificate(certificate: &Certificate) -> Option<Self> {
        let addresses = match certificate.issuer_addresses() {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!(error = %e, "Analytics: cannot read issuer addresses");
                return None;
            },
        };
        let id = match certificate.id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Analytics: cannot read document id");
                return None;
            },
        };

        Some(Self {
            store_addresses: addresses.join(","),
            id,
        })
    }

    /// Build the event for an error code.
    pub fn event(&self, code: ErrorCode) -> AnalyticsEvent {
        AnalyticsEvent {
            category: CERTIFICATE_ERROR_CATEGORY.to_string(),
            action: self.store_addresses.clone(),
            label: self.id.clone(),
            value: code.value(),
        }
    }
}

/// Fire-and-forget analytics collaborator.
pub trait AnalyticsSink: Send + Sync {
    /// Record an event. Must not block or fail.
    fn emit(&self, event: AnalyticsEvent);
}

/// Sink that writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalyticsSink;

impl AnalyticsSink for TracingAnalyticsSink {
    fn emit(&self, event: AnalyticsEvent) {
        info!(
            category = %event.category,
            action = %event.action,
            label = %event.label,
            value = event.value,
            "Analytics event"
        );
    }
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAnalyticsSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemoryAnalyticsSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AnalyticsSink for MemoryAnalyticsSink {
    fn emit(&self, event: AnalyticsEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Emit one event per firing condition. Returns the number emitted.
pub fn emit_failure_events(
    sink: &dyn AnalyticsSink,
    certificate: &Certificate,
    summary: &CheckSummary,
    distinct_identity_code: bool,
) -> usize {
    let conditions = AnalyticsCondition::firing(summary);
    if conditions.is_empty() {
        return 0;
    }

    let Some(details) = AnalyticsDetails::from_certificate(certificate) else {
        debug!("Analytics: skipping emission, certificate lacks store or id");
        return 0;
    };

    for condition in &conditions {
        sink.emit(details.event(condition.code(distinct_identity_code)));
    }
    conditions.len()
}
