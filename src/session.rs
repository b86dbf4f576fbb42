//! Session management for authenticated users.
//!
//! Sessions are stateless signed tokens (JWT, HS256): validity is entirely a
//! function of the signature and the expiry claim. There is no server-side
//! session table, which means logout only removes the client's cookie; a
//! captured token stays valid until natural expiry. Revoking earlier would
//! require a denylist keyed by token id, which this service does not keep.

use crate::config::SessionConfig;
use anyhow::{Context, Result};
use axum::http::{header, HeaderMap};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

// ---

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    //
    /// User ID.
    sub: Uuid,
    username: String,
    /// Issued at (Unix timestamp).
    iat: i64,
    /// Expiry (Unix timestamp), 7 days after issuance by default.
    exp: i64,
}

/// The verified identity a session token asserts.
///
/// This is the entire authentication contract exposed to the record CRUD
/// layer: it consumes `{user_id, username}` and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    //
    pub user_id: Uuid,
    pub username: String,
}

// ---

/// Creates and validates signed session tokens.
#[derive(Clone)]
pub struct SessionIssuer {
    //
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    cookie_secure: bool,
}

impl SessionIssuer {
    // ---
    pub fn new(config: &SessionConfig) -> Self {
        // ---
        let mut ttl_secs = config.ttl.as_secs() as i64;
        if ttl_secs < 0 {
            ttl_secs = 0;
        }
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_secs,
            cookie_secure: config.cookie_secure,
        }
    }

    /// Signs a session token for an authenticated user.
    pub fn create(&self, user_id: Uuid, username: &str) -> Result<String> {
        // ---
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id,
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding).context("failed to sign session token")
    }

    /// Validates a token and extracts the session identity.
    ///
    /// Returns `None` on any signature mismatch, malformed token, or
    /// expiry — never an error to the caller.
    pub fn verify(&self, token: &str) -> Option<SessionInfo> {
        // ---
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding, &validation).ok()?;
        let claims = data.claims;
        if claims.exp <= Utc::now().timestamp() {
            return None;
        }

        Some(SessionInfo {
            user_id: claims.sub,
            username: claims.username,
        })
    }

    /// `Set-Cookie` value binding the token to the client.
    pub fn cookie(&self, token: &str) -> String {
        // ---
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl_secs
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value clearing the session cookie (logout).
    pub fn clear_cookie(&self) -> String {
        // ---
        let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

// ---

/// Extracts and validates the session from a request's cookies.
///
/// Absent cookie, bad signature and expired token all yield `None`; callers
/// translate that to 401 (API routes) or a login redirect (page routes).
pub fn session_from_headers(headers: &HeaderMap, issuer: &SessionIssuer) -> Option<SessionInfo> {
    // ---
    let token = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)?;

    issuer.verify(token)
}

// ---
