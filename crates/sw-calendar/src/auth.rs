//! Access tokens for the Calendar API
//!
//! A [`TokenSource`] hands out a bearer token per request. The service-account
//! source signs a fresh RS256 assertion each time and trades it for an access
//! token; nothing is cached.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{CalendarError, Result};
use crate::models::TokenResponse;

/// Scope requested for every token
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Source of OAuth bearer tokens
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// The fields of a Google service-account key file this crate needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Load a key from a file path, or parse it directly when `value` is a JSON document
    pub fn from_credentials(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.starts_with('{') {
            return Self::from_json(trimmed);
        }

        let path = Path::new(trimmed);
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Credentials(format!(
                "GOOGLE_APPLICATION_CREDENTIALS must point to a readable JSON key file ({}): {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CalendarError::Credentials(format!("Invalid service account key: {}", e)))
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

/// Exchanges signed service-account assertions for access tokens
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: Client,
}

impl ServiceAccountTokenSource {
    /// Create a token source; the private key is validated up front
    pub fn new(key: ServiceAccountKey, http: Client) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CalendarError::Credentials(format!("Invalid private key: {}", e)))?;

        Ok(Self {
            key,
            encoding_key,
            http,
        })
    }

    /// Signed RS256 assertion valid for one hour from now
    fn assertion(&self) -> Result<String> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: CALENDAR_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| CalendarError::Authentication(format!("Failed to sign assertion: {}", e)))
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String> {
        let assertion = self.assertion()?;
        debug!(token_uri = %self.key.token_uri, "Requesting access token");

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CalendarError::Connection(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed: {} - {}", status, error_text);
            return Err(CalendarError::Authentication(format!(
                "Token exchange failed ({}): {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Parse(format!("Failed to parse token response: {}", e)))?;
        Ok(token.access_token)
    }
}

/// A fixed, pre-issued access token
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Stand-in used when no usable credentials are configured
///
/// Every call fails with a credentials error so the server can start and
/// report the problem per request.
pub struct MissingCredentials {
    reason: String,
}

impl MissingCredentials {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TokenSource for MissingCredentials {
    async fn access_token(&self) -> Result<String> {
        Err(CalendarError::Credentials(self.reason.clone()))
    }
}

/// Pick a token source from configuration
///
/// A static access token wins over a service-account key. Unusable
/// credentials are logged and replaced by [`MissingCredentials`].
pub fn token_source_from_config(config: &sw_core::CalendarConfig, http: &Client) -> Arc<dyn TokenSource> {
    if let Some(token) = &config.access_token {
        debug!("Using static access token");
        return Arc::new(StaticTokenSource::new(token.clone()));
    }

    let Some(credentials) = &config.credentials else {
        warn!("GOOGLE_APPLICATION_CREDENTIALS is not set; calendar calls will fail");
        return Arc::new(MissingCredentials::new(
            "GOOGLE_APPLICATION_CREDENTIALS is not set",
        ));
    };

    match ServiceAccountKey::from_credentials(credentials)
        .and_then(|key| ServiceAccountTokenSource::new(key, http.clone()))
    {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("Unusable service account credentials: {}", e);
            Arc::new(MissingCredentials::new(e.to_string()))
        }
    }
}
