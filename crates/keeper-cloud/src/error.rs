use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IamError {
    #[error("service-account private key is not a valid RSA PEM key")]
    InvalidKey { source: jsonwebtoken::errors::Error },

    #[error("failed to sign IAM JWT")]
    Sign { source: jsonwebtoken::errors::Error },

    #[error("IAM token request failed")]
    Request { source: reqwest::Error },

    #[error("IAM token request returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("IAM token response could not be decoded")]
    Decode { source: reqwest::Error },

    #[error("IAM token response has an invalid expiry")]
    Expiry { source: keeper_core::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum TokenCacheError {
    #[error("failed to read token cache {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("token cache {path} is corrupt")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write token cache {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize token cache")]
    Serialize { source: serde_json::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("could not obtain IAM token")]
    Auth {
        #[from]
        source: IamError,
    },

    #[error("invalid instance id {0:?}")]
    InvalidInstanceId(String),

    #[error("compute API request failed")]
    Request { source: reqwest::Error },

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("compute API response could not be decoded")]
    Decode { source: reqwest::Error },

    #[error("compute API returned a malformed instance")]
    Instance { source: serde_json::Error },

    #[error("pagination did not terminate after {pages} pages")]
    Pagination { pages: usize },
}

impl ComputeError {
    /// Error text including the chain of causes, for JSON responses and reports.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}
