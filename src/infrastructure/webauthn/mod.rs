//! WebAuthn ceremony verification backed by `webauthn-rs`.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use uuid::Uuid;
use webauthn_rs::prelude::*;

use crate::config::WebAuthnConfig;
use crate::domain::{
    Authenticator, AuthenticationOutcome, CeremonyVerifier, RegisteredPasskey, VerifierPtr,
};
use crate::error::AuthError;

/// Create the production verifier from relying-party config.
pub fn create_webauthn_verifier(config: &WebAuthnConfig) -> Result<VerifierPtr> {
    // ---
    let rp_origin = Url::parse(&config.origin).context("Invalid AUTH_WEBAUTHN_ORIGIN")?;
    let webauthn = WebauthnBuilder::new(&config.rp_id, &rp_origin)
        .context("Invalid WebAuthn relying-party configuration")?
        .rp_name(&config.rp_name)
        .build()
        .context("Failed to build WebAuthn verifier")?;
    Ok(Arc::new(WebauthnVerifier { webauthn }))
}

struct WebauthnVerifier {
    webauthn: Webauthn,
}

impl CeremonyVerifier for WebauthnVerifier {
    fn registration_options(
        &self,
        user_id: Uuid,
        username: &str,
        exclude: Vec<Vec<u8>>,
    ) -> Result<(serde_json::Value, Vec<u8>), AuthError> {
        // ---
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(exclude.into_iter().map(CredentialID::from).collect())
        };
        let (creation_challenge, reg_state) = self
            .webauthn
            .start_passkey_registration(user_id, username, username, exclude)
            .map_err(|e| anyhow!(e).context("Failed to start registration ceremony"))?;

        let options = serde_json::to_value(&creation_challenge)
            .map_err(|e| anyhow!(e).context("Failed to serialize registration options"))?;
        let state = serde_json::to_vec(&reg_state)
            .map_err(|e| anyhow!(e).context("Failed to serialize registration state"))?;
        Ok((options, state))
    }

    fn verify_registration(
        &self,
        credential: &RegisterPublicKeyCredential,
        state: &[u8],
    ) -> Result<RegisteredPasskey, AuthError> {
        // ---
        let reg_state: PasskeyRegistration = serde_json::from_slice(state)
            .map_err(|e| anyhow!(e).context("Corrupt registration ceremony state"))?;

        let passkey = self
            .webauthn
            .finish_passkey_registration(credential, &reg_state)
            .map_err(|e| {
                tracing::warn!("Registration verification failed: {e}");
                AuthError::VerificationFailed
            })?;

        // Transport hints serialize as lowercase strings ("usb", "nfc", ...);
        // a serde round-trip is the supported way to read them back out.
        let transports: Vec<String> = credential
            .response
            .transports
            .as_ref()
            .and_then(|t| serde_json::to_value(t).ok())
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Ok(RegisteredPasskey {
            credential_id: passkey.cred_id().to_vec(),
            public_key: serde_json::to_vec(&passkey)
                .map_err(|e| anyhow!(e).context("Failed to serialize passkey"))?,
            transports,
        })
    }

    fn authentication_options(
        &self,
        authenticators: &[Authenticator],
    ) -> Result<(serde_json::Value, Vec<u8>), AuthError> {
        // ---
        // Stored passkeys that no longer deserialize are skipped rather
        // than failing the whole ceremony for the user's other credentials.
        let passkeys: Vec<Passkey> = authenticators
            .iter()
            .filter_map(|a| match serde_json::from_slice(&a.public_key) {
                Ok(passkey) => Some(passkey),
                Err(e) => {
                    tracing::error!("Skipping undecodable stored passkey: {e}");
                    None
                }
            })
            .collect();
        if passkeys.is_empty() {
            return Err(AuthError::Internal(anyhow!(
                "No usable stored passkeys for authentication"
            )));
        }

        let (request_challenge, auth_state) = self
            .webauthn
            .start_passkey_authentication(&passkeys)
            .map_err(|e| anyhow!(e).context("Failed to start authentication ceremony"))?;

        let options = serde_json::to_value(&request_challenge)
            .map_err(|e| anyhow!(e).context("Failed to serialize authentication options"))?;
        let state = serde_json::to_vec(&auth_state)
            .map_err(|e| anyhow!(e).context("Failed to serialize authentication state"))?;
        Ok((options, state))
    }

    fn verify_authentication(
        &self,
        credential: &PublicKeyCredential,
        state: &[u8],
    ) -> Result<AuthenticationOutcome, AuthError> {
        // ---
        let auth_state: PasskeyAuthentication = serde_json::from_slice(state)
            .map_err(|e| anyhow!(e).context("Corrupt authentication ceremony state"))?;

        let result = self
            .webauthn
            .finish_passkey_authentication(credential, &auth_state)
            .map_err(|e| {
                tracing::warn!("Authentication verification failed: {e}");
                AuthError::VerificationFailed
            })?;

        Ok(AuthenticationOutcome {
            credential_id: result.cred_id().to_vec(),
            counter: result.counter(),
            backup_eligible: result.backup_eligible(),
            backup_state: result.backup_state(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> WebAuthnConfig {
        WebAuthnConfig {
            rp_id: "localhost".to_string(),
            rp_name: "Todo".to_string(),
            origin: "http://localhost:8080".to_string(),
        }
    }

    #[test]
    fn test_create_verifier_success() {
        assert!(create_webauthn_verifier(&test_config()).is_ok());
    }

    #[test]
    fn test_create_verifier_invalid_origin() {
        let mut config = test_config();
        config.origin = "not a url".to_string();
        assert!(create_webauthn_verifier(&config).is_err());
    }

    #[test]
    fn test_registration_options_shape() {
        let verifier = create_webauthn_verifier(&test_config()).unwrap();
        let (options, state) = verifier
            .registration_options(Uuid::new_v4(), "alice", vec![])
            .unwrap();

        // Client-facing options carry the challenge under publicKey.
        let public_key = options.get("publicKey").expect("publicKey options");
        assert!(public_key.get("challenge").is_some());
        assert_eq!(
            public_key["rp"]["id"],
            serde_json::Value::String("localhost".to_string())
        );
        assert!(!state.is_empty());
    }

    #[test]
    fn test_verify_registration_rejects_corrupt_state() {
        let verifier = create_webauthn_verifier(&test_config()).unwrap();
        let credential: RegisterPublicKeyCredential = serde_json::from_value(serde_json::json!({
            "id": "AAAA",
            "rawId": "AAAA",
            "type": "public-key",
            "extensions": {},
            "response": {
                "attestationObject": "AAAA",
                "clientDataJSON": "AAAA"
            }
        }))
        .unwrap();
        assert!(verifier
            .verify_registration(&credential, b"not-json")
            .is_err());
    }

    #[test]
    fn test_authentication_options_require_usable_passkeys() {
        let verifier = create_webauthn_verifier(&test_config()).unwrap();
        let broken = Authenticator::new(
            b"cred".to_vec(),
            Uuid::new_v4(),
            b"not-a-serialized-passkey".to_vec(),
            0,
            vec![],
        );
        assert!(verifier.authentication_options(&[broken]).is_err());
    }
}
