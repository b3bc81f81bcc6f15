//! Per-certificate session state.
//!
//! One session holds the current certificate, its verification outcome and
//! the state of each on-demand action. A new retrieval replaces the whole
//! session and bumps the sequence number; completions carrying an older
//! [`SessionTicket`] are rejected.

use serde::Serialize;

use crate::dispatch::ShareLink;
use crate::error::{CertflowError, DispatchError};
use crate::types::{Certificate, CertificateReference, SessionState};
use crate::verification::VerificationOutcome;

/// Identifies the session an async step started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTicket {
    sequence: u64,
}

impl SessionTicket {
    /// Sequence number of the session.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// State of one certificate session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CertificateSession {
    sequence: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<CertificateReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<Certificate>,

    retrieval: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    retrieval_error: Option<String>,

    verification: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<VerificationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification_error: Option<String>,

    email: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_error: Option<String>,

    share: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    share_link: Option<ShareLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    share_error: Option<String>,
}

impl CertificateSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&mut self) -> SessionTicket {
        let sequence = self.sequence + 1;
        *self = Self {
            sequence,
            ..Self::default()
        };
        SessionTicket { sequence }
    }

    fn check(&self, ticket: SessionTicket) -> Result<(), CertflowError> {
        if ticket.sequence == self.sequence {
            Ok(())
        } else {
            Err(CertflowError::Superseded {
                sequence: ticket.sequence,
            })
        }
    }

    /// Whether `ticket` belongs to the current session.
    pub fn is_current(&self, ticket: SessionTicket) -> bool {
        ticket.sequence == self.sequence
    }

    // -- retrieval ---------------------------------------------------------

    /// Start a new retrieval, discarding everything held.
    pub fn begin_retrieval(&mut self, reference: CertificateReference) -> SessionTicket {
        let ticket = self.replace();
        self.reference = Some(reference);
        self.retrieval = SessionState::Pending;
        ticket
    }

    /// Store the retrieved certificate and mark verification pending.
    pub fn complete_retrieval(
        &mut self,
        ticket: SessionTicket,
        certificate: Certificate,
    ) -> Result<(), CertflowError> {
        self.check(ticket)?;
        self.certificate = Some(certificate);
        self.retrieval = SessionState::Success;
        self.verification = SessionState::Pending;
        Ok(())
    }

    /// Record a terminal retrieval failure.
    pub fn fail_retrieval(
        &mut self,
        ticket: SessionTicket,
        message: impl Into<String>,
    ) -> Result<(), CertflowError> {
        self.check(ticket)?;
        self.retrieval = SessionState::Failure;
        self.retrieval_error = Some(message.into());
        Ok(())
    }

    /// Hold a certificate obtained without retrieval (e.g. a local file).
    pub fn load_certificate(&mut self, certificate: Certificate) -> SessionTicket {
        let ticket = self.replace();
        self.certificate = Some(certificate);
        self.verification = SessionState::Pending;
        ticket
    }

    // -- verification ------------------------------------------------------

    /// Store the verification outcome.
    pub fn complete_verification(
        &mut self,
        ticket: SessionTicket,
        outcome: VerificationOutcome,
    ) -> Result<(), CertflowError> {
        self.check(ticket)?;
        self.outcome = Some(outcome);
        self.verification = SessionState::Success;
        Ok(())
    }

    /// Record an engine failure.
    pub fn fail_verification(
        &mut self,
        ticket: SessionTicket,
        message: impl Into<String>,
    ) -> Result<(), CertflowError> {
        self.check(ticket)?;
        self.verification = SessionState::Failure;
        self.verification_error = Some(message.into());
        Ok(())
    }

    /// Verification has started and not finished.
    pub fn is_verifying(&self) -> bool {
        self.verification == SessionState::Pending
    }

    // -- send --------------------------------------------------------------

    /// Mark a send pending and hand out the certificate to send.
    ///
    /// A send that is already pending suppresses the new one.
    pub fn begin_send(&mut self) -> Result<(SessionTicket, Certificate), DispatchError> {
        if self.email == SessionState::Pending {
            return Err(DispatchError::InFlight);
        }
        let certificate = self.certificate.clone().ok_or(DispatchError::NoCertificate)?;
        self.email = SessionState::Pending;
        self.email_error = None;
        Ok((self.ticket(), certificate))
    }

    /// Mark the send successful. Returns false for a stale ticket.
    pub fn complete_send(&mut self, ticket: SessionTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.email = SessionState::Success;
        true
    }

    /// Mark the send failed. Returns false for a stale ticket.
    pub fn fail_send(&mut self, ticket: SessionTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.email = SessionState::Failure;
        self.email_error = Some(message.into());
        true
    }

    // -- share -------------------------------------------------------------

    /// Mark a share pending and hand out the certificate to share.
    pub fn begin_share(&mut self) -> Result<(SessionTicket, Certificate), DispatchError> {
        let certificate = self.certificate.clone().ok_or(DispatchError::NoCertificate)?;
        self.share = SessionState::Pending;
        self.share_link = None;
        self.share_error = None;
        Ok((self.ticket(), certificate))
    }

    /// Store the share link. Returns false for a stale ticket.
    pub fn complete_share(&mut self, ticket: SessionTicket, link: ShareLink) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.share = SessionState::Success;
        self.share_link = Some(link);
        true
    }

    /// Mark the share failed. Returns false for a stale ticket.
    pub fn fail_share(&mut self, ticket: SessionTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.share = SessionState::Failure;
        self.share_error = Some(message.into());
        true
    }

    // -- accessors ---------------------------------------------------------

    fn ticket(&self) -> SessionTicket {
        SessionTicket {
            sequence: self.sequence,
        }
    }

    /// Current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Reference the session was retrieved from.
    pub fn reference(&self) -> Option<&CertificateReference> {
        self.reference.as_ref()
    }

    /// Held certificate.
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// Retrieval state.
    pub fn retrieval_state(&self) -> SessionState {
        self.retrieval
    }

    /// Retrieval failure message.
    pub fn retrieval_error(&self) -> Option<&str> {
        self.retrieval_error.as_deref()
    }

    /// Verification state.
    pub fn verification_state(&self) -> SessionState {
        self.verification
    }

    /// Verification outcome.
    pub fn outcome(&self) -> Option<&VerificationOutcome> {
        self.outcome.as_ref()
    }

    /// Verification failure message.
    pub fn verification_error(&self) -> Option<&str> {
        self.verification_error.as_deref()
    }

    /// Email send state.
    pub fn email_state(&self) -> SessionState {
        self.email
    }

    /// Email failure message.
    pub fn email_error(&self) -> Option<&str> {
        self.email_error.as_deref()
    }

    /// Share state.
    pub fn share_state(&self) -> SessionState {
        self.share
    }

    /// Share link returned by the backend.
    pub fn share_link(&self) -> Option<&ShareLink> {
        self.share_link.as_ref()
    }

    /// Share failure message.
    pub fn share_error(&self) -> Option<&str> {
        self.share_error.as_deref()
    }
}
