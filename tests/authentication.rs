//! Integration tests for the passkey authentication ceremony, including
//! the anti-replay signature counter.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{body_json, mock_auth_credential, post_json, session_cookie, TestHarness};
use todo_auth::domain::{CeremonyPurpose, PendingCeremony};

// ============================================================================
// Authentication Start Tests
// ============================================================================

#[tokio::test]
async fn auth_start_returns_allow_list_options() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": "alice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let options = json.get("options").expect("options in response");
    let allow = options["publicKey"]["allowCredentials"]
        .as_array()
        .expect("allow list");
    assert_eq!(allow.len(), 1);
}

#[tokio::test]
async fn auth_start_unknown_user_is_404() {
    // ---
    let harness = TestHarness::new();

    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": "nobody" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Authentication Finish Tests
// ============================================================================

#[tokio::test]
async fn auth_finish_issues_session() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": "alice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": "alice",
            "credential": mock_auth_credential(b"cred-alice")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("session cookie set");
    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");

    let response = common::get_with_cookie(harness.app(), "/api/me", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_finish_challenge_is_single_use() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;
    common::login_user(&harness, "alice", b"cred-alice").await;

    // Replaying the finish after a successful login finds no ceremony.
    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": "alice",
            "credential": mock_auth_credential(b"cred-alice")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auth_finish_rejects_expired_challenge() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    // Plant an already-expired login ceremony for the user, as if the
    // client had waited past the TTL before finishing.
    let user = harness
        .state
        .registry()
        .find_user_by_username("alice")
        .await
        .unwrap()
        .expect("registered user");
    let ceremony = PendingCeremony::new(
        CeremonyPurpose::Authentication,
        user.id,
        common::MOCK_AUTH_STATE.to_vec(),
        Duration::ZERO,
    );
    harness
        .state
        .challenges()
        .put("alice", ceremony)
        .await
        .unwrap();

    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": "alice",
            "credential": mock_auth_credential(b"cred-alice")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn auth_finish_rejects_unknown_credential() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": "alice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // An assertion for credential bytes we never stored is a 404, even
    // though it would otherwise verify.
    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": "alice",
            "credential": mock_auth_credential(b"someone-elses-cred")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_finish_rejects_failed_verification() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": "alice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    harness.verifier.set_failing(true);
    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": "alice",
            "credential": mock_auth_credential(b"cred-alice")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Signature Counter Tests
// ============================================================================

#[tokio::test]
async fn auth_finish_counter_must_advance() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    harness.verifier.set_counter(5);
    common::login_user(&harness, "alice", b"cred-alice").await;

    harness.verifier.set_counter(6);
    common::login_user(&harness, "alice", b"cred-alice").await;

    // Same counter again: suspected replay, no session.
    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": "alice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": "alice",
            "credential": mock_auth_credential(b"cred-alice")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&response).is_none());
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("replay"));
}

#[tokio::test]
async fn auth_finish_rejects_counter_regression() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    harness.verifier.set_counter(10);
    common::login_user(&harness, "alice", b"cred-alice").await;

    harness.verifier.set_counter(3);
    let response = post_json(
        harness.app(),
        "/auth/login/start",
        json!({ "username": "alice" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = post_json(
        harness.app(),
        "/auth/login/finish",
        json!({
            "username": "alice",
            "credential": mock_auth_credential(b"cred-alice")
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A later, properly advanced assertion still works.
    harness.verifier.set_counter(11);
    common::login_user(&harness, "alice", b"cred-alice").await;
}

#[tokio::test]
async fn auth_finish_allows_counterless_authenticators() {
    // ---
    // Authenticators that do not implement counters report zero forever.
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;

    harness.verifier.set_counter(0);
    common::login_user(&harness, "alice", b"cred-alice").await;
    common::login_user(&harness, "alice", b"cred-alice").await;
}
