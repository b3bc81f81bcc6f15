//! Classification of verification reports into user-facing error categories.
//!
//! ## Precedence
//!
//! Categories are emitted in a fixed order, one per failing check:
//!
//! ```text
//! HASH → ISSUED → REVOKED → IDENTITY
//! ```
//!
//! An invalid issuer address makes every other check fail in ways that
//! look unrelated, so when it is reported alongside a status failure the
//! whole list collapses to `ADDRESS_INVALID`.

use serde::{Deserialize, Serialize};

use crate::report::{is_valid, CheckType, VerificationReport};

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Document contents were modified.
    Hash,
    /// Document was not issued.
    Issued,
    /// Document was revoked.
    Revoked,
    /// Issuer identity could not be confirmed.
    Identity,
    /// Issuer store address is malformed.
    AddressInvalid,
}

impl ErrorCategory {
    /// Every category.
    pub const ALL: [ErrorCategory; 5] = [
        ErrorCategory::Hash,
        ErrorCategory::Issued,
        ErrorCategory::Revoked,
        ErrorCategory::Identity,
        ErrorCategory::AddressInvalid,
    ];

    /// Short failure title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Hash => "Certificate has been tampered with",
            Self::Issued => "Certificate not issued",
            Self::Revoked => "Certificate has been revoked",
            Self::Identity => "Certificate from unregistered institution",
            Self::AddressInvalid => "Certificate store address is invalid",
        }
    }

    /// Longer explanation shown under the title.
    pub fn message(self) -> &'static str {
        match self {
            Self::Hash => {
                "The contents of this certificate are inaccurate and have been tampered with."
            },
            Self::Issued => {
                "This certificate cannot be found. Please contact your issuing institution for help or issue the certificate before trying again."
            },
            Self::Revoked => {
                "This certificate has been revoked by your issuing institution. Please contact your issuing institution for more details."
            },
            Self::Identity => {
                "The institution that issued this certificate is not registered. Please contact your issuing institution for more details."
            },
            Self::AddressInvalid => {
                "Please inform the issuer of this certificate that the certificate store address is invalid."
            },
        }
    }
}

/// Pass/fail for each partitioned check, plus the issuance signals.
///
/// Computed once per report and shared by classification and analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Integrity over all fragments.
    pub integrity: bool,
    /// Status over every fragment except the revocation one.
    pub issued: bool,
    /// Status over the revocation fragment alone.
    pub not_revoked: bool,
    /// Identity over all fragments.
    pub identity: bool,
    /// An issuance fragment reports the document was never issued.
    pub not_yet_issued: bool,
    /// An issuance fragment reports a malformed issuer address.
    pub address_invalid: bool,
}

impl CheckSummary {
    /// Evaluate every partitioned check over a report.
    pub fn evaluate(report: &VerificationReport) -> Self {
        // No revocation fragment means nothing reported a revocation.
        let not_revoked = report.revocation_fragment().map_or(true, |fragment| {
            is_valid(std::slice::from_ref(fragment), &[CheckType::DocumentStatus])
        });

        Self {
            integrity: report.is_valid(&[CheckType::DocumentIntegrity]),
            issued: is_valid(report.without_revocation(), &[CheckType::DocumentStatus]),
            not_revoked,
            identity: report.is_valid(&[CheckType::IssuerIdentity]),
            not_yet_issued: report.not_yet_issued(),
            address_invalid: report.address_invalid(),
        }
    }
}

/// Result of classifying one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The full report is valid under every check.
    pub valid: bool,
    /// Failing categories in precedence order; empty when `valid`.
    pub categories: Vec<ErrorCategory>,
}

impl Classification {
    /// The category to surface to the user, if any.
    pub fn primary(&self) -> Option<ErrorCategory> {
        self.categories.first().copied()
    }
}

/// Classify a verification report.
pub fn classify(report: &VerificationReport) -> Classification {
    if report.is_fully_valid() {
        return Classification {
            valid: true,
            categories: Vec::new(),
        };
    }

    Classification {
        valid: false,
        categories: categories_for(&CheckSummary::evaluate(report)),
    }
}

fn categories_for(summary: &CheckSummary) -> Vec<ErrorCategory> {
    if !summary.issued && summary.address_invalid {
        return vec![ErrorCategory::AddressInvalid];
    }

    [
        (summary.integrity, ErrorCategory::Hash),
        (summary.issued, ErrorCategory::Issued),
        (summary.not_revoked, ErrorCategory::Revoked),
        (summary.identity, ErrorCategory::Identity),
    ]
    .into_iter()
    .filter(|(passed, _)| !passed)
    .map(|(_, category)| category)
    .collect()
}
