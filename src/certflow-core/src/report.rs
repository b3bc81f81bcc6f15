//! Verification reports as returned by the verification engine.
//!
//! A report is an ordered list of fragments. Each fragment is the outcome
//! of one named verifier, tagged with the check it contributes to:
//!
//! | Check                | Example fragment names                                   |
//! |----------------------|----------------------------------------------------------|
//! | `DOCUMENT_INTEGRITY` | `OpenAttestationHash`                                    |
//! | `DOCUMENT_STATUS`    | `OpenAttestationEthereumDocumentStoreIssued`, `...Revoked` |
//! | `ISSUER_IDENTITY`    | `OpenAttestationDnsTxt`, registry verifiers              |

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fragment reporting whether the document has been revoked.
pub const REVOCATION_FRAGMENT: &str = "OpenAttestationEthereumDocumentStoreRevoked";

/// Fragment reporting whether a document store issued the document.
pub const DOCUMENT_STORE_ISSUED_FRAGMENT: &str = "OpenAttestationEthereumDocumentStoreIssued";

/// Fragment reporting whether a token registry minted the document.
pub const TOKEN_REGISTRY_MINTED_FRAGMENT: &str = "OpenAttestationEthereumTokenRegistryMinted";

/// Issuance reason code: the document was never issued.
pub const NOT_ISSUED_CODE: i64 = 1;

/// Issuance reason code: the issuer's store address is malformed.
pub const INVALID_ADDRESS_CODE: i64 = 2;

/// The check a fragment contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckType {
    /// The document has not been modified.
    DocumentIntegrity,
    /// The document is issued and not revoked.
    DocumentStatus,
    /// The issuer is who it claims to be.
    IssuerIdentity,
}

impl CheckType {
    /// Every check, in reporting order.
    pub const ALL: [CheckType; 3] = [
        CheckType::DocumentIntegrity,
        CheckType::DocumentStatus,
        CheckType::IssuerIdentity,
    ];
}

/// Outcome of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FragmentStatus {
    /// Check passed.
    Valid,
    /// Check failed.
    Invalid,
    /// The verifier could not run to completion.
    Error,
    /// The verifier does not apply to this document.
    Skipped,
}

/// Why a fragment did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Reason {
    /// Numeric reason code, verifier specific.
    pub code: i64,
    /// Symbolic reason code.
    pub code_string: String,
    /// Human-readable message.
    pub message: String,
}

/// One verifier's result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Verifier name.
    pub name: String,
    /// Check this fragment contributes to.
    #[serde(rename = "type")]
    pub check: CheckType,
    /// Outcome.
    pub status: FragmentStatus,
    /// Verifier-specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl Fragment {
    /// Create a fragment without data or reason.
    pub fn new(name: impl Into<String>, check: CheckType, status: FragmentStatus) -> Self {
        Self {
            name: name.into(),
            check,
            status,
            data: None,
            reason: None,
        }
    }

    /// Attach a reason code.
    #[must_use]
    pub fn with_reason(mut self, code: i64, code_string: impl Into<String>) -> Self {
        self.reason = Some(Reason {
            code,
            code_string: code_string.into(),
            message: String::new(),
        });
        self
    }

    fn reason_code(&self) -> Option<i64> {
        self.reason.as_ref().map(|r| r.code)
    }

    fn is_issuance(&self) -> bool {
        self.name == DOCUMENT_STORE_ISSUED_FRAGMENT || self.name == TOKEN_REGISTRY_MINTED_FRAGMENT
    }
}

/// Whether `fragments` pass every check in `checks`.
///
/// A check passes when at least one fragment reports it, at least one of
/// those is `VALID`, and none is `INVALID` or `ERROR`.
pub fn is_valid<'a, I>(fragments: I, checks: &[CheckType]) -> bool
where
    I: IntoIterator<Item = &'a Fragment>,
    I::IntoIter: Clone,
{
    let fragments = fragments.into_iter();
    checks.iter().all(|check| {
        let mut relevant = fragments.clone().filter(|f| f.check == *check).peekable();
        if relevant.peek().is_none() {
            return false;
        }
        let mut any_valid = false;
        for fragment in relevant {
            match fragment.status {
                FragmentStatus::Valid => any_valid = true,
                FragmentStatus::Skipped => {},
                FragmentStatus::Invalid | FragmentStatus::Error => return false,
            }
        }
        any_valid
    })
}

/// Ordered collection of fragments for one certificate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationReport {
    fragments: Vec<Fragment>,
}

impl VerificationReport {
    /// Create a report from fragments.
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }

    /// All fragments.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Whether every check passes over the full report.
    pub fn is_fully_valid(&self) -> bool {
        is_valid(&self.fragments, &CheckType::ALL)
    }

    /// Whether the given checks pass over the full report.
    pub fn is_valid(&self, checks: &[CheckType]) -> bool {
        is_valid(&self.fragments, checks)
    }

    /// The revocation fragment, if the engine produced one.
    pub fn revocation_fragment(&self) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.name == REVOCATION_FRAGMENT)
    }

    /// Every fragment except the revocation one.
    pub fn without_revocation(&self) -> impl Iterator<Item = &Fragment> + Clone {
        self.fragments.iter().filter(|f| f.name != REVOCATION_FRAGMENT)
    }

    /// The issuance fragment reports the document was never issued.
    pub fn not_yet_issued(&self) -> bool {
        self.has_issuance_code(NOT_ISSUED_CODE)
    }

    /// The issuance fragment reports a malformed issuer address.
    pub fn address_invalid(&self) -> bool {
        self.has_issuance_code(INVALID_ADDRESS_CODE)
    }

    fn has_issuance_code(&self, code: i64) -> bool {
        self.fragments
            .iter()
            .filter(|f| f.is_issuance())
            .any(|f| f.reason_code() == Some(code))
    }
}

impl From<Vec<Fragment>> for VerificationReport {
    fn from(fragments: Vec<Fragment>) -> Self {
        Self::new(fragments)
    }
}
