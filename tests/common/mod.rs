// Test helpers are intentionally partially used
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use todo_auth::domain::{
    Authenticator, AuthenticationOutcome, CeremonyVerifier, RegisteredPasskey,
};
use todo_auth::{
    create_memory_challenge_store, create_memory_registry, create_noop_metrics,
    create_router_with, AppState, AuthError, SessionConfig, SessionIssuer,
};
use webauthn_rs::prelude::{PublicKeyCredential, RegisterPublicKeyCredential};

// ============================================================================
// Simulated ceremony verifier
// ============================================================================

pub const MOCK_REG_STATE: &[u8] = b"mock-reg-state";
pub const MOCK_AUTH_STATE: &[u8] = b"mock-auth-state";

/// Verifier that accepts simulated authenticator responses.
///
/// It treats the credential's `rawId` bytes as the credential ID and
/// reports whatever counter the test configured, which is what makes
/// the replay and counter-regression paths testable without a browser.
pub struct MockVerifier {
    /// Counter reported for the next verified assertion.
    pub next_counter: AtomicU32,
    /// When set, every verification fails as if the signature were bad.
    pub fail_verification: AtomicBool,
}

impl MockVerifier {
    pub fn new() -> Arc<Self> {
        Arc::new(MockVerifier {
            next_counter: AtomicU32::new(1),
            fail_verification: AtomicBool::new(false),
        })
    }

    pub fn set_counter(&self, value: u32) {
        self.next_counter.store(value, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_verification.store(failing, Ordering::SeqCst);
    }
}

impl CeremonyVerifier for MockVerifier {
    fn registration_options(
        &self,
        _user_id: Uuid,
        username: &str,
        _exclude: Vec<Vec<u8>>,
    ) -> Result<(Value, Vec<u8>), AuthError> {
        let options = json!({
            "publicKey": {
                "challenge": "c2ltdWxhdGVk",
                "rp": { "id": "localhost", "name": "Todo" },
                "user": { "name": username }
            }
        });
        Ok((options, MOCK_REG_STATE.to_vec()))
    }

    fn verify_registration(
        &self,
        credential: &RegisterPublicKeyCredential,
        state: &[u8],
    ) -> Result<RegisteredPasskey, AuthError> {
        if self.fail_verification.load(Ordering::SeqCst) || state != MOCK_REG_STATE {
            return Err(AuthError::VerificationFailed);
        }
        Ok(RegisteredPasskey {
            credential_id: credential.raw_id.to_vec(),
            public_key: b"simulated-public-key".to_vec(),
            transports: vec!["internal".to_string()],
        })
    }

    fn authentication_options(
        &self,
        authenticators: &[Authenticator],
    ) -> Result<(Value, Vec<u8>), AuthError> {
        let allow: Vec<String> = authenticators
            .iter()
            .map(|a| URL_SAFE_NO_PAD.encode(&a.id))
            .collect();
        let options = json!({
            "publicKey": {
                "challenge": "c2ltdWxhdGVk",
                "allowCredentials": allow
            }
        });
        Ok((options, MOCK_AUTH_STATE.to_vec()))
    }

    fn verify_authentication(
        &self,
        credential: &PublicKeyCredential,
        state: &[u8],
    ) -> Result<AuthenticationOutcome, AuthError> {
        if self.fail_verification.load(Ordering::SeqCst) || state != MOCK_AUTH_STATE {
            return Err(AuthError::VerificationFailed);
        }
        Ok(AuthenticationOutcome {
            credential_id: credential.raw_id.to_vec(),
            counter: self.next_counter.load(Ordering::SeqCst),
            backup_eligible: false,
            backup_state: false,
        })
    }
}

// ============================================================================
// Test harness
// ============================================================================

pub struct TestHarness {
    pub state: AppState,
    pub verifier: Arc<MockVerifier>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_challenge_ttl(Duration::from_secs(300))
    }

    /// Harness with a custom ceremony TTL, for expiry tests.
    pub fn with_challenge_ttl(ttl: Duration) -> Self {
        // ---
        let verifier = MockVerifier::new();
        let sessions = SessionIssuer::new(&SessionConfig {
            secret: "an-integration-test-secret-of-32+-bytes".to_string(),
            ttl: Duration::from_secs(604_800),
            cookie_secure: false,
        });
        let state = AppState::new(
            create_memory_registry(),
            create_memory_challenge_store(),
            verifier.clone(),
            sessions,
            create_noop_metrics().expect("noop metrics"),
            ttl,
        );
        TestHarness { state, verifier }
    }

    /// Fresh router over the shared state. `oneshot` consumes the router,
    /// so each request gets its own.
    pub fn app(&self) -> Router {
        create_router_with(self.state.clone())
    }
}

// ============================================================================
// Request helpers
// ============================================================================

pub async fn post_json(app: Router, path: &str, body: Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, path: &str) -> Response {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_with_cookie(app: Router, path: &str, cookie: &str) -> Response {
    let request = Request::builder()
        .uri(path)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Extract the `session=...` pair from a Set-Cookie header, if present.
pub fn session_cookie(response: &Response) -> Option<String> {
    // ---
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = raw.split(';').next()?.trim();
    pair.starts_with("session=").then(|| pair.to_string())
}

// ============================================================================
// Simulated client responses
// ============================================================================

pub fn mock_register_credential(credential_id: &[u8]) -> Value {
    let id = URL_SAFE_NO_PAD.encode(credential_id);
    json!({
        "id": id,
        "rawId": id,
        "type": "public-key",
        "extensions": {},
        "response": {
            "attestationObject": "c2ltdWxhdGVk",
            "clientDataJSON": "c2ltdWxhdGVk",
            "transports": ["internal"]
        }
    })
}

pub fn mock_auth_credential(credential_id: &[u8]) -> Value {
    let id = URL_SAFE_NO_PAD.encode(credential_id);
    json!({
        "id": id,
        "rawId": id,
        "type": "public-key",
        "extensions": {},
        "response": {
            "authenticatorData": "c2ltdWxhdGVk",
            "clientDataJSON": "c2ltdWxhdGVk",
            "signature": "c2ltdWxhdGVk",
            "userHandle": null
        }
    })
}

// ============================================================================
// Flow drivers
// ============================================================================

/// Run the full registration ceremony; panics unless both phases return 200.
/// Returns the session cookie set by the finish response.
pub async fn register_user(harness: &TestHarness, username: &str, credential_id: &[u8]) -> String {
    // ---
    let response = post_json(
        harness.app(),
        "/auth/register/start",
        json!({ "username": username }),
    )
    .await;
    assert_eq!(response.status(), 200, "register start should succeed");

    let response = post_json(
        harness.app(),
        "/auth/register/finish",
        json!({
            "username": username,
            "credential": mock_register_credential(credential_id)
        }),
    )
    .await;
    assert_eq!(response.status(), 200, "register finish should succeed");
    session_cookie(&response).expect("finish should set a session cookie")
}

/// Run the full authentication ceremony; panics unless both phases return
/// 200. Returns the session cookie set by the finish response.
pub async fn login_user(harness: &TestHarness, username: &str, credential_id: &[u8]) -> String {
    // ---
    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": username }),
    )
    .await;
    assert_eq!(response.status(), 200, "login start should succeed");

    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": username,
            "credential": mock_auth_credential(credential_id)
        }),
    )
    .await;
    assert_eq!(response.status(), 200, "login finish should succeed");
    session_cookie(&response).expect("finish should set a session cookie")
}
