//! Webhook verification handshake.
//!
//! The platform proves endpoint ownership with a GET carrying `hub.mode`,
//! `hub.verify_token` and `hub.challenge`. The challenge is echoed back only
//! when the mode is `subscribe` and the token equals the configured secret.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Mode value the platform sends when subscribing.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Query parameters of a verification request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationRequest {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,

    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,

    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Why a verification request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("missing query parameter {0}")]
    MissingParameter(&'static str),

    #[error("unexpected hub.mode '{0}'")]
    ModeMismatch(String),

    #[error("verify token does not match")]
    TokenMismatch,
}

/// Checks verification requests against the shared secret.
pub struct WebhookVerifier {
    token: Secret<String>,
}

impl WebhookVerifier {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }

    /// Returns the challenge to echo, or why the request is rejected.
    pub fn verify(&self, request: &VerificationRequest) -> Result<String, VerificationError> {
        let mode = request
            .mode
            .as_deref()
            .ok_or(VerificationError::MissingParameter("hub.mode"))?;
        let token = request
            .verify_token
            .as_deref()
            .ok_or(VerificationError::MissingParameter("hub.verify_token"))?;
        let challenge = request
            .challenge
            .as_deref()
            .ok_or(VerificationError::MissingParameter("hub.challenge"))?;

        if mode != SUBSCRIBE_MODE {
            return Err(VerificationError::ModeMismatch(mode.to_string()));
        }
        if !self.token_matches(token) {
            return Err(VerificationError::TokenMismatch);
        }
        Ok(challenge.to_string())
    }

    /// Constant-time comparison with the configured secret.
    pub fn token_matches(&self, candidate: &str) -> bool {
        let expected = self.token.expose_secret().as_bytes();
        // Slices of different length compare unequal
        expected.ct_eq(candidate.as_bytes()).unwrap_u8() == 1
    }
}
