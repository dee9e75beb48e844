use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("unknown build variant {0:?}; expected one of: script, asgi, native")]
    UnknownVariant(String),

    // ── Service-account key ──
    #[error("failed to read key file {path}")]
    KeyFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse key file {path}")]
    KeyFileParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("key file {path} has no `{field}`")]
    KeyFileMissingField { path: PathBuf, field: &'static str },

    #[error("invalid URL secret: {0}")]
    InvalidUrlSecret(&'static str),

    #[error(
        "no URL secret configured; set KEEPER_URL_SECRET, [server].url_secret in keeper.toml, or url_secret in the key file"
    )]
    MissingUrlSecret,

    // ── Time ──
    #[error("invalid RFC 3339 timestamp {value:?}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },
}
