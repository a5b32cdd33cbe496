//! Service-account access tokens for the Google APIs.
//!
//! Signs an RS256 JWT with the service account's private key and exchanges it
//! at the token endpoint (JWT-bearer grant). Tokens are cached until shortly
//! before they expire.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::ports::SpreadsheetError;

/// Scopes needed to write cells and export the spreadsheet.
pub const SHEETS_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";

pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Source of OAuth bearer tokens for the spreadsheet API.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<Secret<String>, SpreadsheetError>;
}

/// Fixed token, for tests and for tokens minted outside the process.
pub struct StaticTokenSource {
    token: Secret<String>,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<Secret<String>, SpreadsheetError> {
        Ok(Secret::new(self.token.expose_secret().clone()))
    }
}

/// Fields of a downloaded service-account key file that matter here.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: Secret<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, SpreadsheetError> {
        serde_json::from_str(json).map_err(|e| {
            SpreadsheetError::Authentication(format!("invalid service account key: {}", e))
        })
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SpreadsheetError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            SpreadsheetError::Authentication(format!(
                "cannot read credentials {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: Secret<String>,
    fetched_at: Instant,
    lifetime: Duration,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() + REFRESH_MARGIN < self.lifetime
    }
}

/// Token source backed by a service-account key.
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    token_url: String,
    http_client: reqwest::Client,
    cache: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountTokenSource {
    /// Uses the key's own `token_uri` unless `token_url` overrides it.
    pub fn new(
        key: ServiceAccountKey,
        token_url: Option<String>,
        http_client: reqwest::Client,
    ) -> Self {
        let token_url = token_url
            .or_else(|| key.token_uri.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());
        Self {
            key,
            token_url,
            http_client,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Builds the signed assertion sent to the token endpoint.
    fn signed_assertion(&self) -> Result<String, SpreadsheetError> {
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPES,
            aud: &self.token_url,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.expose_secret().as_bytes())
            .map_err(|e| SpreadsheetError::Authentication(format!("invalid private key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SpreadsheetError::Authentication(format!("cannot sign assertion: {}", e)))
    }

    async fn fetch_token(&self) -> Result<CachedToken, SpreadsheetError> {
        let assertion = self.signed_assertion()?;

        tracing::debug!(token_url = %self.token_url, "Requesting spreadsheet access token");

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SpreadsheetError::network(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpreadsheetError::Authentication(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpreadsheetError::InvalidResponse(format!("token response: {}", e)))?;

        Ok(CachedToken {
            token: Secret::new(token.access_token),
            fetched_at: Instant::now(),
            lifetime: Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<Secret<String>, SpreadsheetError> {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.is_fresh() {
                    return Ok(Secret::new(cached.token.expose_secret().clone()));
                }
            }
        }

        let fresh = self.fetch_token().await?;
        let token = Secret::new(fresh.token.expose_secret().clone());
        *self.cache.write().await = Some(fresh);
        Ok(token)
    }
}
