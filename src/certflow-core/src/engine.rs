//! Certificate orchestration engine.
//!
//! This module drives one certificate session end to end:
//! 1. Retrieval (fetch, unwrap, decrypt)
//! 2. Verification through the external engine
//! 3. Classification of the report
//! 4. Navigation or analytics
//!
//! Send and share run on demand against the held certificate.
//!
//! ## Concurrency
//!
//! The session is single-writer (this engine) and multi-reader through
//! [`CertflowEngine::snapshot`]. Steps never hold the session lock across
//! an await. A retrieval started later wins: an earlier one that finishes
//! afterwards returns [`CertflowError::Superseded`] and changes nothing.

use std::sync::{Arc, PoisonError, RwLock};

use certflow_crypto::{Decryptor, OpenAttestationDecryptor};
use tracing::{debug, info, instrument, warn};

use crate::analytics::{AnalyticsSink, TracingAnalyticsSink};
use crate::config::{saturating_millis, CertflowConfig};
use crate::dispatch::{EmailDispatcher, ShareDispatcher, ShareLink};
use crate::error::{CertflowError, DispatchError};
use crate::retrieval::Retriever;
use crate::session::{CertificateSession, SessionTicket};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{Certificate, CertificateReference};
use crate::verification::{
    HttpVerificationEngine, LogNavigator, Navigator, VerificationEngine, VerificationOutcome,
    Verifier,
};

/// Message recorded when the email backend does not accept a send.
pub const SEND_FAILED_MESSAGE: &str = "Fail to send certificate";

/// Message recorded when the share backend returns nothing.
pub const SHARE_FAILED_MESSAGE: &str = "Fail to generate certificate share link";

/// External collaborators the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// HTTP transport for retrieval and dispatch.
    pub transport: Arc<dyn HttpTransport>,
    /// Codec for encrypted documents.
    pub decryptor: Arc<dyn Decryptor>,
    /// Verification engine.
    pub engine: Arc<dyn VerificationEngine>,
    /// Navigation target for valid certificates.
    pub navigator: Arc<dyn Navigator>,
    /// Analytics sink for invalid certificates.
    pub analytics: Arc<dyn AnalyticsSink>,
}

impl Collaborators {
    /// Production collaborators built from configuration.
    pub fn from_config(config: &CertflowConfig) -> Result<Self, CertflowError> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self {
            engine: Arc::new(HttpVerificationEngine::new(
                Arc::clone(&transport),
                config.verifier_api_url.clone(),
            )),
            transport,
            decryptor: Arc::new(OpenAttestationDecryptor::new()),
            navigator: Arc::new(LogNavigator),
            analytics: Arc::new(TracingAnalyticsSink),
        })
    }
}

/// The certificate orchestration engine.
///
/// This is the entry point for retrieving, verifying, sending and sharing.
pub struct CertflowEngine {
    config: CertflowConfig,
    retriever: Retriever,
    verifier: Verifier,
    email: EmailDispatcher,
    share: ShareDispatcher,
    session: RwLock<CertificateSession>,
}

impl CertflowEngine {
    /// Create an engine with production collaborators.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: CertflowConfig) -> Result<Self, CertflowError> {
        config.validate()?;
        let collaborators = Collaborators::from_config(&config)?;
        Ok(Self::with_collaborators(config, collaborators))
    }

    /// Create an engine with explicit collaborators.
    pub fn with_collaborators(config: CertflowConfig, collaborators: Collaborators) -> Self {
        info!(
            network = %config.network,
            email_api = %config.email_api_url,
            share_api = %config.share_link_api_url,
            share_ttl_ms = saturating_millis(config.share_link_ttl),
            "CertflowEngine: initialized"
        );

        let Collaborators {
            transport,
            decryptor,
            engine,
            navigator,
            analytics,
        } = collaborators;

        Self {
            retriever: Retriever::new(Arc::clone(&transport), decryptor),
            verifier: Verifier::new(engine, navigator, analytics, config.network.clone())
                .with_distinct_identity_code(config.distinct_identity_code),
            email: EmailDispatcher::new(Arc::clone(&transport), config.email_api_url.clone()),
            share: ShareDispatcher::new(
                transport,
                config.share_link_api_url.clone(),
                config.share_link_ttl,
            ),
            session: RwLock::new(CertificateSession::new()),
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &CertflowConfig {
        &self.config
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> CertificateSession {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with_session<T>(&self, f: impl FnOnce(&mut CertificateSession) -> T) -> T {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    /// Retrieve a certificate, verify it and run the effects.
    ///
    /// Replaces the current session. Returns the outcome even when the
    /// certificate is invalid; errors are reserved for retrieval and engine
    /// failures.
    #[instrument(skip(self, reference), fields(uri = %reference.uri))]
    pub async fn retrieve_certificate(
        &self,
        reference: CertificateReference,
    ) -> Result<VerificationOutcome, CertflowError> {
        let ticket = self.with_session(|s| s.begin_retrieval(reference.clone()));
        debug!(sequence = ticket.sequence(), "Retrieval started");

        let certificate = match self.retriever.retrieve(&reference).await {
            Ok(certificate) => certificate,
            Err(e) => {
                warn!(error = %e, "Retrieval failed");
                let message = e.to_string();
                self.with_session(|s| s.fail_retrieval(ticket, message))?;
                return Err(e.into());
            },
        };

        self.with_session(|s| s.complete_retrieval(ticket, certificate.clone()))?;
        self.verify_held(ticket, certificate).await
    }

    /// Hold an already-obtained certificate, verify it and run the effects.
    #[instrument(skip_all)]
    pub async fn load_certificate(
        &self,
        certificate: Certificate,
    ) -> Result<VerificationOutcome, CertflowError> {
        let ticket = self.with_session(|s| s.load_certificate(certificate.clone()));
        self.verify_held(ticket, certificate).await
    }

    async fn verify_held(
        &self,
        ticket: SessionTicket,
        certificate: Certificate,
    ) -> Result<VerificationOutcome, CertflowError> {
        match self.verifier.verify(&certificate).await {
            Ok(outcome) => {
                self.with_session(|s| s.complete_verification(ticket, outcome.clone()))?;
                self.verifier.dispatch_effects(&certificate, &outcome);
                info!(
                    valid = outcome.is_valid(),
                    primary = ?outcome.classification.primary(),
                    "Verification complete"
                );
                Ok(outcome)
            },
            Err(e) => {
                let message = e.to_string();
                self.with_session(|s| s.fail_verification(ticket, message))?;
                Err(e.into())
            },
        }
    }

    /// Email the held certificate.
    ///
    /// A send already pending suppresses this one with
    /// [`DispatchError::InFlight`] and leaves the pending send untouched.
    #[instrument(skip(self, email, captcha))]
    pub async fn send_certificate(&self, email: &str, captcha: &str) -> Result<(), CertflowError> {
        let (ticket, certificate) = self.with_session(CertificateSession::begin_send)?;

        let result = match self.email.send(&certificate, email, captcha).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DispatchError::rejected(SEND_FAILED_MESSAGE)),
            Err(e) => Err(e),
        };

        let applied = self.with_session(|s| match &result {
            Ok(()) => s.complete_send(ticket),
            Err(e) => s.fail_send(ticket, e.to_string()),
        });
        if !applied {
            debug!(sequence = ticket.sequence(), "Send finished for a replaced session");
        }

        result.map_err(Into::into)
    }

    /// Create a share link for the held certificate.
    #[instrument(skip(self))]
    pub async fn generate_share_link(&self) -> Result<ShareLink, CertflowError> {
        let (ticket, certificate) = self.with_session(CertificateSession::begin_share)?;

        let result = match self.share.share(&certificate).await {
            Ok(link) if link.is_null() => Err(DispatchError::rejected(SHARE_FAILED_MESSAGE)),
            other => other,
        };

        let applied = self.with_session(|s| match &result {
            Ok(link) => s.complete_share(ticket, link.clone()),
            Err(e) => s.fail_share(ticket, e.to_string()),
        });
        if !applied {
            debug!(sequence = ticket.sequence(), "Share finished for a replaced session");
        }

        result.map_err(Into::into)
    }

    /// Reference that resolves a share link through [`Self::retrieve_certificate`].
    pub fn share_reference(&self, link: &ShareLink) -> Option<CertificateReference> {
        link.reference(&self.config.share_link_api_url)
    }
}
