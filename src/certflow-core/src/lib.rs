//! # certflow-core
//!
//! Certificate retrieval and verification orchestrator.
//!
//! Takes a certificate reference (URI plus optional key) through fetch,
//! decryption, verification and classification, then reacts to the result.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CertflowEngine                            │
//! │                                                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
//! │  │ HttpTransport│  │  Decryptor   │  │   Session    │      │
//! │  │  (reqwest)   │  │  (AES-GCM)   │  │ (sequenced)  │      │
//! │  └──────────────┘  └──────────────┘  └──────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │                  Retriever                        │      │
//! │  │     (GET, envelope unwrap, payload kind)         │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │                  Verifier                         │      │
//! │  │  (engine report → classifier → nav/analytics)    │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │         EmailDispatcher / ShareDispatcher         │      │
//! │  │          (on demand, held certificate)           │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Classification
//!
//! Failures are reported in a fixed order (HASH, ISSUED, REVOKED,
//! IDENTITY). An invalid issuer address alongside a status failure
//! collapses the list to ADDRESS_INVALID.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod action;
pub mod analytics;
pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod report;
pub mod retrieval;
pub mod session;
pub mod transport;
pub mod types;
pub mod verification;
pub mod wrapped;

pub use action::{ActionPayload, ActionRequest, DOCUMENT_ACTION};
pub use analytics::{
    emit_failure_events, AnalyticsCondition, AnalyticsEvent, AnalyticsSink, ErrorCode,
    MemoryAnalyticsSink, TracingAnalyticsSink,
};
pub use classifier::{classify, CheckSummary, Classification, ErrorCategory};
pub use config::CertflowConfig;
pub use engine::{CertflowEngine, Collaborators};
pub use error::{
    ActionError, CertflowError, DecryptionError, DispatchError, RetrievalError,
    VerificationError, WrappedDocumentError,
};
pub use report::{is_valid, CheckType, Fragment, FragmentStatus, Reason, VerificationReport};
pub use retrieval::{PayloadKind, Retriever};
pub use session::{CertificateSession, SessionTicket};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use types::{Certificate, CertificateReference, Route, SessionState};
pub use verification::{
    EngineError, HttpVerificationEngine, LogNavigator, Navigator, VerificationEngine,
    VerificationOutcome, Verifier,
};
pub use dispatch::{EmailDispatcher, ShareDispatcher, ShareLink};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
