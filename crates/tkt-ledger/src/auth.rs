//! Bearer tokens for the Sheets REST API.
//!
//! [`ServiceAccountTokens`] implements the service-account JWT bearer grant:
//! sign an RS256 assertion with the account's private key, exchange it at the
//! token endpoint, cache the access token until shortly before it expires.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::LedgerError;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh this many seconds before the upstream expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, LedgerError>;
}

/// A pre-issued token. Never refreshed.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, LedgerError> {
        Ok(self.0.clone())
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
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Service-account token source. The private key never leaves this struct.
pub struct ServiceAccountTokens {
    http: reqwest::Client,
    principal: String,
    key: EncodingKey,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccountTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokens")
            .field("principal", &self.principal)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokens {
    /// Parse the PEM key up front so a malformed key fails before any
    /// request is made.
    pub fn new(
        principal: impl Into<String>,
        private_key_pem: &str,
        token_url: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        Self::with_timeout(principal, private_key_pem, token_url, crate::DEFAULT_REQUEST_TIMEOUT)
    }

    /// As [`Self::new`], with an explicit bound on each token exchange.
    pub fn with_timeout(
        principal: impl Into<String>,
        private_key_pem: &str,
        token_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|e| {
            LedgerError::Unavailable(format!("invalid service account private key: {e}"))
        })?;
        Ok(Self {
            http: crate::http_client(timeout)?,
            principal: principal.into(),
            key,
            token_url: token_url.into(),
            cached: Mutex::new(None),
        })
    }

    /// Signed JWT bearer assertion issued at `now` (epoch seconds).
    pub fn assertion(&self, now: i64) -> Result<String, LedgerError> {
        let claims = AssertionClaims {
            iss: &self.principal,
            scope: SHEETS_SCOPE,
            aud: &self.token_url,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| LedgerError::Unavailable(format!("assertion signing failed: {e}")))
    }

    async fn exchange(&self, now: i64) -> Result<CachedToken, LedgerError> {
        let assertion = self.assertion(now)?;
        let resp = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| crate::transport_error("token request", &e))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = match resp.json::<TokenErrorResponse>().await {
                Ok(body) => format!(
                    "{}: {}",
                    body.error.unwrap_or_else(|| "error".to_string()),
                    body.error_description.unwrap_or_default()
                ),
                Err(_) => "unreadable error body".to_string(),
            };
            return Err(LedgerError::Unavailable(format!(
                "token exchange rejected status={} {detail}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| crate::transport_error("token response decode", &e))?;

        debug!(expires_in = body.expires_in, "service account token issued");
        Ok(CachedToken {
            token: body.access_token,
            expires_at: now + body.expires_in,
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, LedgerError> {
        let now = chrono::Utc::now().timestamp();
        // Held across the exchange so concurrent callers share one refresh.
        // The client timeout bounds how long they wait behind it.
        let mut cached = self.cached.lock().await;
        if let Some(tok) = cached.as_ref() {
            if tok.expires_at - REFRESH_MARGIN_SECS > now {
                return Ok(tok.token.clone());
            }
        }
        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
