use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::cache::{CachedToken, TokenCache};
use crate::error::IamError;
use crate::iam::TokenIssuer;

/// Bearer token for API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<SecretString, IamError>;
}

/// Hands out a cached IAM token and refreshes it shortly before expiry.
///
/// The token is kept in memory and mirrored to a [`TokenCache`] file so a
/// restart reuses it. Callers racing on an expired token wait on the same
/// lock, so only one of them refreshes.
pub struct CachedTokenProvider {
    issuer: Arc<dyn TokenIssuer>,
    cache: TokenCache,
    margin_secs: i64,
    current: Mutex<Option<CachedToken>>,
}

impl CachedTokenProvider {
    pub fn new(issuer: Arc<dyn TokenIssuer>, cache: TokenCache, margin_secs: i64) -> Self {
        Self {
            issuer,
            cache,
            margin_secs,
            current: Mutex::new(None),
        }
    }

    fn load_cache(&self) -> Option<CachedToken> {
        match self.cache.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "ignoring unreadable token cache");
                None
            }
        }
    }
}

#[async_trait]
impl TokenSource for CachedTokenProvider {
    async fn token(&self) -> Result<SecretString, IamError> {
        let mut current = self.current.lock().await;
        if current.is_none() {
            *current = self.load_cache();
        }

        let now = chrono::Utc::now().timestamp();
        if let Some(token) = current.as_ref()
            && token.is_fresh(now, self.margin_secs)
        {
            tracing::debug!("using cached IAM token");
            return Ok(SecretString::from(token.token.clone()));
        }

        tracing::info!("IAM token expired or missing, refreshing");
        let issued = self.issuer.issue().await?;
        let fresh = CachedToken {
            token: issued.token.expose_secret().to_owned(),
            expiry: issued.expires_at,
        };
        if let Err(e) = self.cache.save(&fresh) {
            tracing::error!(error = %e, "failed to persist IAM token; continuing with in-memory copy");
        }
        *current = Some(fresh);
        tracing::info!("IAM token refreshed");

        Ok(issued.token)
    }
}
