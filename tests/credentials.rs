//! Integration tests for credential management endpoints.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tower::ServiceExt;

mod common;
use common::{body_json, get_with_cookie, TestHarness};

async fn delete_with_cookie(
    app: axum::Router,
    path: &str,
    cookie: &str,
) -> axum::response::Response {
    let request = Request::builder()
        .method("DELETE")
        .uri(path)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[tokio::test]
async fn list_credentials_shows_own_passkeys() {
    // ---
    let harness = TestHarness::new();
    let cookie = common::register_user(&harness, "alice", b"cred-alice").await;

    let response = get_with_cookie(harness.app(), "/api/credentials", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let credentials = json["data"].as_array().expect("credential list");
    assert_eq!(credentials.len(), 1);
    assert_eq!(
        credentials[0]["id"],
        URL_SAFE_NO_PAD.encode(b"cred-alice")
    );
    assert_eq!(credentials[0]["transports"][0], "internal");
    assert!(credentials[0].get("created_at").is_some());
}

#[tokio::test]
async fn list_credentials_does_not_leak_other_users() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;
    let bob_cookie = common::register_user(&harness, "bob", b"cred-bob").await;

    let response = get_with_cookie(harness.app(), "/api/credentials", &bob_cookie).await;
    let json = body_json(response).await;
    let credentials = json["data"].as_array().unwrap();
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0]["id"], URL_SAFE_NO_PAD.encode(b"cred-bob"));
}

#[tokio::test]
async fn delete_credential_removes_own_passkey() {
    // ---
    let harness = TestHarness::new();
    let cookie = common::register_user(&harness, "alice", b"cred-alice").await;

    let id = URL_SAFE_NO_PAD.encode(b"cred-alice");
    let response =
        delete_with_cookie(harness.app(), &format!("/api/credentials/{id}"), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["deleted"], id);

    let response = get_with_cookie(harness.app(), "/api/credentials", &cookie).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_credential_of_other_user_is_forbidden() {
    // ---
    let harness = TestHarness::new();
    common::register_user(&harness, "alice", b"cred-alice").await;
    let bob_cookie = common::register_user(&harness, "bob", b"cred-bob").await;

    let id = URL_SAFE_NO_PAD.encode(b"cred-alice");
    let response =
        delete_with_cookie(harness.app(), &format!("/api/credentials/{id}"), &bob_cookie).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Alice's credential is untouched and she can still log in.
    common::login_user(&harness, "alice", b"cred-alice").await;
}

#[tokio::test]
async fn delete_unknown_credential_is_404() {
    // ---
    let harness = TestHarness::new();
    let cookie = common::register_user(&harness, "alice", b"cred-alice").await;

    let id = URL_SAFE_NO_PAD.encode(b"never-registered");
    let response =
        delete_with_cookie(harness.app(), &format!("/api/credentials/{id}"), &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Garbage that is not even base64url also reads as not found.
    let response =
        delete_with_cookie(harness.app(), "/api/credentials/!!!not-b64", &cookie).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
