//! IAM token issuance for a service account.
//!
//! A short-lived JWT signed with the service-account key (PS256) is
//! exchanged for an IAM token at the token endpoint.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use keeper_core::ServiceAccountKey;
use keeper_core::time::iso_to_unix;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::IamError;

/// Lifetime of the signed JWT, not of the IAM token it buys.
pub const JWT_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign the exchange JWT. `audience` is the IAM token endpoint URL.
pub fn create_jwt(key: &ServiceAccountKey, audience: &str, now: i64) -> Result<String, IamError> {
    let claims = JwtClaims {
        aud: audience.to_owned(),
        iss: key.service_account_id.clone(),
        iat: now,
        exp: now + JWT_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::PS256);
    header.kid = Some(key.key_id.clone());

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
        .map_err(|e| IamError::InvalidKey { source: e })?;

    jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(|e| IamError::Sign { source: e })
}

/// A freshly issued IAM token.
#[derive(Clone)]
pub struct IamToken {
    pub token: SecretString,
    /// Unix seconds
    pub expires_at: i64,
}

impl std::fmt::Debug for IamToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of new IAM tokens; the seam the token cache refreshes through.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self) -> Result<IamToken, IamError>;
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    jwt: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeResponse {
    iam_token: String,
    expires_at: String,
}

/// Exchanges service-account JWTs for IAM tokens over HTTP.
pub struct IamClient {
    http: reqwest::Client,
    url: String,
    key: ServiceAccountKey,
}

impl IamClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>, key: ServiceAccountKey) -> Self {
        Self {
            http,
            url: url.into(),
            key,
        }
    }
}

#[async_trait]
impl TokenIssuer for IamClient {
    async fn issue(&self) -> Result<IamToken, IamError> {
        let now = chrono::Utc::now().timestamp();
        let jwt = create_jwt(&self.key, &self.url, now)?;

        tracing::debug!(url = %self.url, "requesting IAM token");
        let response = self
            .http
            .post(&self.url)
            .json(&ExchangeRequest { jwt: &jwt })
            .send()
            .await
            .map_err(|e| IamError::Request { source: e })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            tracing::error!(status = status.as_u16(), %body, "IAM token request rejected");
            return Err(IamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: ExchangeResponse = response
            .json()
            .await
            .map_err(|e| IamError::Decode { source: e })?;
        let expires_at =
            iso_to_unix(&data.expires_at).map_err(|e| IamError::Expiry { source: e })?;

        tracing::info!(expires_at, "IAM token issued");
        Ok(IamToken {
            token: SecretString::from(data.iam_token),
            expires_at,
        })
    }
}
