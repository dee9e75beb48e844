use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TokenCacheError;

/// On-disk cache entry: `{"jwt": "<iam token>", "expiry": <unix secs>}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    #[serde(rename = "jwt")]
    pub token: String,
    #[serde(default)]
    pub expiry: i64,
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl CachedToken {
    /// Still usable at `now` when refreshing `margin` seconds early.
    pub fn is_fresh(&self, now: i64, margin: i64) -> bool {
        !self.token.is_empty()
            && self
                .expiry
                .checked_sub(margin)
                .is_some_and(|deadline| now < deadline)
    }
}

/// JSON file holding the last issued IAM token.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::info!(path = %path.display(), "token cache initialized");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no cache file exists yet.
    pub fn load(&self) -> Result<Option<CachedToken>, TokenCacheError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "token cache not found");
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| TokenCacheError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        let token: CachedToken =
            serde_json::from_str(&content).map_err(|e| TokenCacheError::Parse {
                path: self.path.clone(),
                source: e,
            })?;
        tracing::debug!(expiry = token.expiry, "loaded token from cache");
        Ok(Some(token))
    }

    pub fn save(&self, token: &CachedToken) -> Result<(), TokenCacheError> {
        let content =
            serde_json::to_string(token).map_err(|e| TokenCacheError::Serialize { source: e })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TokenCacheError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|e| TokenCacheError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(expiry = token.expiry, "saved token to cache");
        Ok(())
    }
}
