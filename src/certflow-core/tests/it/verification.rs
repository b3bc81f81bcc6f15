//! Verification effects: navigation on success, analytics on failure.

use serde_json::json;

use certflow_core::{
    AnalyticsEvent, CertflowConfig, CertflowError, Certificate, CheckType, ErrorCategory,
    Fragment, FragmentStatus, Route, SessionState, VerificationReport,
};

use crate::support::{
    fragment, report, valid_report, wrapped_document, FakeEngine, FakeTransport, Harness,
    WRAPPED_ID, WRAPPED_STORES,
};

fn event(value: u8) -> AnalyticsEvent {
    AnalyticsEvent {
        category: "CERTIFICATE_ERROR".into(),
        action: WRAPPED_STORES.into(),
        label: WRAPPED_ID.into(),
        value,
    }
}

async fn verify(report: VerificationReport) -> (Harness, certflow_core::VerificationOutcome) {
    let harness = Harness::new(FakeTransport::new(), FakeEngine::returning(report));
    let outcome = harness
        .engine
        .load_certificate(Certificate::new(wrapped_document()))
        .await
        .unwrap();
    (harness, outcome)
}

#[tokio::test]
async fn valid_certificate_navigates_to_viewer() {
    let (harness, outcome) = verify(valid_report()).await;

    assert!(outcome.is_valid());
    assert!(outcome.classification.categories.is_empty());
    assert_eq!(harness.navigator.routes(), vec![Route::Viewer]);
    assert!(harness.analytics.events().is_empty());

    let snapshot = harness.engine.snapshot();
    assert_eq!(snapshot.verification_state(), SessionState::Success);
    assert_eq!(snapshot.outcome(), Some(&outcome));
}

#[tokio::test]
async fn engine_receives_certificate_and_network() {
    let (harness, _) = verify(valid_report()).await;

    let calls = harness.verifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, wrapped_document());
    assert_eq!(calls[0].1, "homestead");
}

#[tokio::test]
async fn tampered_certificate_emits_hash_event() {
    let (harness, outcome) = verify(report(false, true, true, true)).await;

    assert!(!outcome.is_valid());
    assert_eq!(outcome.classification.categories, vec![ErrorCategory::Hash]);
    assert!(harness.navigator.routes().is_empty());
    assert_eq!(harness.analytics.events(), vec![event(1)]);
}

#[tokio::test]
async fn not_issued_emits_unissued_event() {
    let report = VerificationReport::new(vec![
        fragment("OpenAttestationHash", CheckType::DocumentIntegrity, true),
        fragment(
            "OpenAttestationEthereumDocumentStoreIssued",
            CheckType::DocumentStatus,
            false,
        )
        .with_reason(1, "DOCUMENT_NOT_ISSUED"),
        fragment(
            "OpenAttestationEthereumDocumentStoreRevoked",
            CheckType::DocumentStatus,
            true,
        ),
        fragment("OpenAttestationDnsTxt", CheckType::IssuerIdentity, true),
    ]);
    let (harness, outcome) = verify(report).await;

    assert_eq!(outcome.classification.categories, vec![ErrorCategory::Issued]);
    assert_eq!(harness.analytics.events(), vec![event(2)]);
}

#[tokio::test]
async fn other_status_failure_emits_store_event() {
    let (harness, _) = verify(report(true, false, true, true)).await;
    assert_eq!(harness.analytics.events(), vec![event(4)]);
}

#[tokio::test]
async fn revoked_emits_revoked_event() {
    let (harness, outcome) = verify(report(true, true, false, true)).await;

    assert_eq!(outcome.classification.categories, vec![ErrorCategory::Revoked]);
    assert_eq!(harness.analytics.events(), vec![event(3)]);
}

#[tokio::test]
async fn identity_failure_uses_unissued_code_by_default() {
    let (harness, outcome) = verify(report(true, true, true, false)).await;

    assert_eq!(outcome.classification.categories, vec![ErrorCategory::Identity]);
    assert_eq!(harness.analytics.events(), vec![event(2)]);
}

#[tokio::test]
async fn identity_failure_with_distinct_code() {
    let config = CertflowConfig {
        distinct_identity_code: true,
        ..CertflowConfig::default()
    };
    let harness = Harness::with_config(
        config,
        FakeTransport::new(),
        FakeEngine::returning(report(true, true, true, false)),
    );
    harness
        .engine
        .load_certificate(Certificate::new(wrapped_document()))
        .await
        .unwrap();

    assert_eq!(harness.analytics.events(), vec![event(0)]);
}

#[tokio::test]
async fn independent_conditions_each_emit() {
    let (harness, outcome) = verify(report(false, true, false, false)).await;

    assert_eq!(
        outcome.classification.categories,
        vec![
            ErrorCategory::Hash,
            ErrorCategory::Revoked,
            ErrorCategory::Identity
        ]
    );
    assert_eq!(harness.analytics.events(), vec![event(1), event(3), event(2)]);
}

#[tokio::test]
async fn address_invalid_collapses_categories_but_not_analytics() {
    let report = VerificationReport::new(vec![
        fragment("OpenAttestationHash", CheckType::DocumentIntegrity, false),
        fragment(
            "OpenAttestationEthereumTokenRegistryMinted",
            CheckType::DocumentStatus,
            false,
        )
        .with_reason(2, "INVALID_ADDRESS"),
        fragment("OpenAttestationDnsTxt", CheckType::IssuerIdentity, false),
    ]);
    let (harness, outcome) = verify(report).await;

    assert_eq!(
        outcome.classification.categories,
        vec![ErrorCategory::AddressInvalid]
    );
    assert_eq!(harness.analytics.events(), vec![event(1), event(4), event(2)]);
}

#[tokio::test]
async fn malformed_certificate_skips_analytics() {
    let harness = Harness::new(
        FakeTransport::new(),
        FakeEngine::returning(report(false, true, true, true)),
    );
    let outcome = harness
        .engine
        .load_certificate(Certificate::new(json!({"not": "wrapped"})))
        .await
        .unwrap();

    assert!(!outcome.is_valid());
    assert!(harness.analytics.events().is_empty());
    assert!(harness.navigator.routes().is_empty());
}

#[tokio::test]
async fn engine_failure_is_a_verification_error() {
    let harness = Harness::new(FakeTransport::new(), FakeEngine::failing("rpc unavailable"));

    let err = harness
        .engine
        .load_certificate(Certificate::new(wrapped_document()))
        .await
        .unwrap_err();

    assert!(matches!(err, CertflowError::Verification(_)));
    assert_eq!(err.to_string(), "Verification errored: rpc unavailable");

    let snapshot = harness.engine.snapshot();
    assert_eq!(snapshot.verification_state(), SessionState::Failure);
    assert_eq!(
        snapshot.verification_error(),
        Some("Verification errored: rpc unavailable")
    );
    assert!(harness.navigator.routes().is_empty());
    assert!(harness.analytics.events().is_empty());
}

#[tokio::test]
async fn skipped_fragments_do_not_fail_checks() {
    let mut fragments = valid_report().fragments().to_vec();
    fragments.push(Fragment::new(
        "OpenAttestationEthereumTokenRegistryMinted",
        CheckType::DocumentStatus,
        FragmentStatus::Skipped,
    ));
    let (harness, outcome) = verify(VerificationReport::new(fragments)).await;

    assert!(outcome.is_valid());
    assert_eq!(harness.navigator.routes(), vec![Route::Viewer]);
}

#[tokio::test]
async fn verifying_twice_gives_identical_classification() {
    let harness = Harness::new(
        FakeTransport::new(),
        FakeEngine::returning(report(false, false, true, false)),
    );
    let certificate = Certificate::new(wrapped_document());

    let first = harness.engine.load_certificate(certificate.clone()).await.unwrap();
    let second = harness.engine.load_certificate(certificate).await.unwrap();
    assert_eq!(first.classification, second.classification);
}
