//! Retrieval against a scripted transport and the real codec.

use std::sync::Arc;

use serde_json::json;

use certflow_core::{CertificateReference, HttpResponse, RetrievalError, Retriever};
use certflow_crypto::{encrypt_string, generate_key, CryptoError, OpenAttestationDecryptor};

use crate::support::{wrapped_document, FakeTransport};

const URI: &str = "https://storage.test/cert.json";

fn retriever(transport: FakeTransport) -> (Retriever, Arc<FakeTransport>) {
    let transport = Arc::new(transport);
    let retriever = Retriever::new(transport.clone(), Arc::new(OpenAttestationDecryptor::new()));
    (retriever, transport)
}

#[tokio::test]
async fn plain_document_is_returned_as_is() {
    let (retriever, _) = retriever(FakeTransport::new().on_get_json(URI, wrapped_document()));

    let certificate = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap();
    assert_eq!(certificate.as_value(), &wrapped_document());
}

#[tokio::test]
async fn document_envelope_is_unwrapped_once() {
    let (retriever, _) =
        retriever(FakeTransport::new().on_get_json(URI, json!({"document": {"a": 1}})));

    let certificate = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap();
    assert_eq!(certificate.as_value(), &json!({"a": 1}));
}

#[tokio::test]
async fn not_found_fails_before_parsing() {
    // The body is not JSON; reaching the parser would give MalformedDocument.
    let (retriever, _) =
        retriever(FakeTransport::new().on_get(URI, HttpResponse::new(404, "<html>nope</html>")));

    let err = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap_err();
    assert!(matches!(err, RetrievalError::HttpFailure { status: 404, .. }));
    assert_eq!(
        err.to_string(),
        format!("Unable to load the certificate from {}", URI)
    );
}

#[tokio::test]
async fn server_error_is_http_failure() {
    let (retriever, _) = retriever(FakeTransport::new().on_get(URI, HttpResponse::new(503, "")));

    let err = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap_err();
    assert!(matches!(err, RetrievalError::HttpFailure { status: 503, .. }));
}

#[tokio::test]
async fn empty_bodies_are_empty_documents() {
    for body in ["", "  ", "null", "\"\""] {
        let (retriever, _) = retriever(FakeTransport::new().on_get(URI, HttpResponse::new(200, body)));

        let err = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap_err();
        assert!(
            matches!(err, RetrievalError::EmptyDocument { .. }),
            "body {:?} gave {:?}",
            body,
            err
        );
    }
}

#[tokio::test]
async fn empty_document_field_keeps_outer_object() {
    let body = json!({"document": "", "a": 1});
    let (retriever, _) = retriever(FakeTransport::new().on_get_json(URI, body.clone()));

    let certificate = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap();
    assert_eq!(certificate.as_value(), &body);
}

#[tokio::test]
async fn empty_key_on_plain_document_is_ignored() {
    let (retriever, _) = retriever(FakeTransport::new().on_get_json(URI, wrapped_document()));

    let certificate = retriever
        .retrieve(&CertificateReference::new(URI).with_key(""))
        .await
        .unwrap();
    assert_eq!(certificate.as_value(), &wrapped_document());
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let (retriever, _) =
        retriever(FakeTransport::new().on_get(URI, HttpResponse::new(200, "certificate!")));

    let err = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap_err();
    assert!(matches!(err, RetrievalError::MalformedDocument { .. }));
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let (retriever, _) = retriever(FakeTransport::new().on_get_error(URI, "connection reset"));

    let err = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap_err();
    match err {
        RetrievalError::Transport { uri, reason } => {
            assert_eq!(uri, URI);
            assert_eq!(reason, "connection reset");
        },
        other => panic!("Expected Transport, got {:?}", other),
    }
}

#[tokio::test]
async fn encrypted_document_is_decrypted() {
    let encrypted = encrypt_string(&wrapped_document().to_string(), None).unwrap();
    let (retriever, _) = retriever(
        FakeTransport::new().on_get_json(URI, serde_json::to_value(&encrypted.document).unwrap()),
    );

    let reference = CertificateReference::new(URI).with_key(encrypted.key);
    let certificate = retriever.retrieve(&reference).await.unwrap();
    assert_eq!(certificate.as_value(), &wrapped_document());
}

#[tokio::test]
async fn encrypted_document_inside_envelope() {
    let encrypted = encrypt_string(r#"{"a":1}"#, None).unwrap();
    let (retriever, _) = retriever(
        FakeTransport::new().on_get_json(URI, json!({ "document": encrypted.document })),
    );

    let reference = CertificateReference::new(URI).with_key(encrypted.key);
    let certificate = retriever.retrieve(&reference).await.unwrap();
    assert_eq!(certificate.as_value(), &json!({"a": 1}));
}

#[tokio::test]
async fn key_without_encrypted_type_is_undecipherable() {
    let (retriever, _) = retriever(FakeTransport::new().on_get_json(URI, wrapped_document()));

    let reference = CertificateReference::new(URI).with_key(generate_key());
    let err = retriever.retrieve(&reference).await.unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::UndecipherableDocument {
            key: Some(_),
            document_type: None
        }
    ));
}

#[tokio::test]
async fn key_with_unknown_type_is_undecipherable() {
    let (retriever, _) =
        retriever(FakeTransport::new().on_get_json(URI, json!({"type": "OTHER-CIPHER", "cipherText": "x"})));

    let reference = CertificateReference::new(URI).with_key(generate_key());
    let err = retriever.retrieve(&reference).await.unwrap_err();
    match err {
        RetrievalError::UndecipherableDocument { document_type, .. } => {
            assert_eq!(document_type.as_deref(), Some("OTHER-CIPHER"));
        },
        other => panic!("Expected UndecipherableDocument, got {:?}", other),
    }
}

#[tokio::test]
async fn typed_payload_without_key_is_undecipherable() {
    let encrypted = encrypt_string(r#"{"a":1}"#, None).unwrap();
    let (retriever, _) = retriever(
        FakeTransport::new().on_get_json(URI, serde_json::to_value(&encrypted.document).unwrap()),
    );

    let err = retriever.retrieve(&CertificateReference::new(URI)).await.unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::UndecipherableDocument { key: None, document_type: Some(_) }
    ));
}

#[tokio::test]
async fn wrong_key_fails_decryption() {
    let encrypted = encrypt_string(r#"{"a":1}"#, None).unwrap();
    let (retriever, _) = retriever(
        FakeTransport::new().on_get_json(URI, serde_json::to_value(&encrypted.document).unwrap()),
    );

    let reference = CertificateReference::new(URI).with_key(generate_key());
    let err = retriever.retrieve(&reference).await.unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::Decryption(CryptoError::AuthenticationFailed)
    ));
}

#[tokio::test]
async fn encrypted_envelope_missing_fields_fails_decryption() {
    let (retriever, _) = retriever(
        FakeTransport::new().on_get_json(URI, json!({"type": "OPEN-ATTESTATION-TYPE-1"})),
    );

    let reference = CertificateReference::new(URI).with_key(generate_key());
    let err = retriever.retrieve(&reference).await.unwrap_err();
    assert!(matches!(err, RetrievalError::Decryption(_)));
}

#[tokio::test]
async fn every_retrieval_refetches() {
    let (retriever, transport) =
        retriever(FakeTransport::new().on_get_json(URI, json!({"a": 1})));
    let reference = CertificateReference::new(URI);

    retriever.retrieve(&reference).await.unwrap();
    retriever.retrieve(&reference).await.unwrap();
    assert_eq!(transport.requested(), vec![URI.to_string(), URI.to_string()]);
}
