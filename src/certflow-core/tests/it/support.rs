//! Fake collaborators and fixtures shared by the integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use certflow_core::{
    CertflowConfig, CertflowEngine, Certificate, CheckType, Collaborators, EngineError, Fragment,
    FragmentStatus, HttpResponse, HttpTransport, MemoryAnalyticsSink, Navigator, Route,
    TransportError, VerificationEngine, VerificationReport,
};
use certflow_crypto::OpenAttestationDecryptor;

pub const EMAIL_API: &str = "https://api.certflow.io/email";
pub const SHARE_API: &str = "https://api.certflow.io/storage";

// =============================================================================
// Transport
// =============================================================================

/// Scripted transport: canned responses per URI, with optional gates that
/// hold a GET until released.
#[derive(Default)]
pub struct FakeTransport {
    gets: Mutex<HashMap<String, Result<HttpResponse, TransportError>>>,
    posts: Mutex<HashMap<String, HttpResponse>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    requested: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, Value)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(self, uri: &str, response: HttpResponse) -> Self {
        self.gets.lock().unwrap().insert(uri.to_string(), Ok(response));
        self
    }

    pub fn on_get_json(self, uri: &str, body: Value) -> Self {
        self.on_get(uri, HttpResponse::json(200, &body))
    }

    pub fn on_get_error(self, uri: &str, message: &str) -> Self {
        self.gets
            .lock()
            .unwrap()
            .insert(uri.to_string(), Err(TransportError::new(message)));
        self
    }

    pub fn on_post(self, uri: &str, response: HttpResponse) -> Self {
        self.posts.lock().unwrap().insert(uri.to_string(), response);
        self
    }

    /// Hold requests to `uri` until the returned notify fires.
    pub fn gate(&self, uri: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(uri.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<(String, Value)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(&self, uri: &str) -> Result<HttpResponse, TransportError> {
        self.requested.lock().unwrap().push(uri.to_string());

        let gate = self.gates.lock().unwrap().get(uri).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.gets
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::new(404, "not found")))
    }

    async fn post_json(&self, uri: &str, body: &Value) -> Result<HttpResponse, TransportError> {
        self.posted
            .lock()
            .unwrap()
            .push((uri.to_string(), body.clone()));

        let gate = self.gates.lock().unwrap().get(uri).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.posts
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| TransportError::new(format!("no route for {}", uri)))
    }
}

// =============================================================================
// Verification engine / navigator
// =============================================================================

/// Engine that always answers with the same report (or error).
pub struct FakeEngine {
    answer: Result<VerificationReport, EngineError>,
    calls: Mutex<Vec<(Value, String)>>,
}

impl FakeEngine {
    pub fn returning(report: VerificationReport) -> Self {
        Self {
            answer: Ok(report),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(EngineError::new(message)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Value, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationEngine for FakeEngine {
    async fn verify(
        &self,
        certificate: &Certificate,
        network: &str,
    ) -> Result<VerificationReport, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push((certificate.as_value().clone(), network.to_string()));
        self.answer.clone()
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn fragment(name: &str, check: CheckType, ok: bool) -> Fragment {
    let status = if ok {
        FragmentStatus::Valid
    } else {
        FragmentStatus::Invalid
    };
    Fragment::new(name, check, status)
}

/// Report with one fragment per check plus the revocation fragment.
pub fn report(hash: bool, issued: bool, not_revoked: bool, identity: bool) -> VerificationReport {
    VerificationReport::new(vec![
        fragment("OpenAttestationHash", CheckType::DocumentIntegrity, hash),
        fragment(
            "OpenAttestationEthereumDocumentStoreIssued",
            CheckType::DocumentStatus,
            issued,
        ),
        fragment(
            "OpenAttestationEthereumDocumentStoreRevoked",
            CheckType::DocumentStatus,
            not_revoked,
        ),
        fragment("OpenAttestationDnsTxt", CheckType::IssuerIdentity, identity),
    ])
}

pub fn valid_report() -> VerificationReport {
    report(true, true, true, true)
}

/// A wrapped certificate with an id and two issuer stores.
pub fn wrapped_document() -> Value {
    json!({
        "version": "https://schema.openattestation.com/2.0/schema.json",
        "data": {
            "id": "3f1a:string:CERT-2019-001",
            "name": "9b2c:string:Bachelor of Engineering",
            "issuers": [
                {"name": "1c1c:string:Uni A", "documentStore": "2d2d:string:0x007d40224f6562461633ccfbaffd359ebb2fc9ba"},
                {"name": "3e3e:string:Uni B", "certificateStore": "4f4f:string:0x532C9Ff853CA54370D7492cD84040F9f8099f11B"}
            ]
        },
        "signature": {
            "type": "SHA3MerkleProof",
            "targetHash": "f7432b3219b2aa4122e289f44901830fa32f224ee9dfce28565677f1d279b2c7",
            "proof": [],
            "merkleRoot": "f7432b3219b2aa4122e289f44901830fa32f224ee9dfce28565677f1d279b2c7"
        }
    })
}

pub const WRAPPED_STORES: &str =
    "0x007d40224f6562461633ccfbaffd359ebb2fc9ba,0x532C9Ff853CA54370D7492cD84040F9f8099f11B";

pub const WRAPPED_ID: &str = "CERT-2019-001";

/// An engine wired to fakes, with handles to inspect them.
pub struct Harness {
    pub engine: CertflowEngine,
    pub transport: Arc<FakeTransport>,
    pub verifier: Arc<FakeEngine>,
    pub navigator: Arc<RecordingNavigator>,
    pub analytics: Arc<MemoryAnalyticsSink>,
}

impl Harness {
    pub fn new(transport: FakeTransport, verifier: FakeEngine) -> Self {
        Self::with_config(CertflowConfig::default(), transport, verifier)
    }

    pub fn with_config(config: CertflowConfig, transport: FakeTransport, verifier: FakeEngine) -> Self {
        let transport = Arc::new(transport);
        let verifier = Arc::new(verifier);
        let navigator = Arc::new(RecordingNavigator::default());
        let analytics = Arc::new(MemoryAnalyticsSink::new());

        let engine = CertflowEngine::with_collaborators(
            config,
            Collaborators {
                transport: transport.clone(),
                decryptor: Arc::new(OpenAttestationDecryptor::new()),
                engine: verifier.clone(),
                navigator: navigator.clone(),
                analytics: analytics.clone(),
            },
        );

        Self {
            engine,
            transport,
            verifier,
            navigator,
            analytics,
        }
    }
}
