use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// File name looked up in the project directory.
pub const CONFIG_FILE: &str = "keeper.toml";

/// keeper.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeeperConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub autostart: AutoStartConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Listening port, also the port documented in generated Dockerfiles
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public prefix all routes live under
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    /// Directory holding index.html, default.html and 404.html
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Path segment guarding the dashboard and API.
    /// Falls back to `url_secret` in the key file when unset.
    #[serde(default)]
    pub url_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Service-account authorized key (JSON)
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
    /// On-disk IAM token cache
    #[serde(default = "default_token_cache")]
    pub token_cache: PathBuf,
    /// Compute API base URL
    #[serde(default = "default_compute_url")]
    pub compute_url: String,
    /// IAM token exchange endpoint, also the JWT audience
    #[serde(default = "default_iam_url")]
    pub iam_url: String,
    /// Per-request timeout against the cloud APIs
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Refresh the IAM token this many seconds before it expires
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoStartConfig {
    /// Run the background auto-start loop
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between auto-start checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Page size used when listing instances
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Container recipe to generate
    #[serde(default)]
    pub variant: Variant,
    /// Python runtime image for the script and asgi variants
    #[serde(default = "default_base_image")]
    pub base_image: String,
    /// Dependency manifest copied and installed before the sources
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Working directory (asgi variant)
    #[serde(default = "default_workdir")]
    pub workdir: String,
    /// Entry script (script variant)
    #[serde(default = "default_script")]
    pub script: String,
    /// `module:object` served by the ASGI server (asgi variant)
    #[serde(default = "default_app_target")]
    pub app_target: String,
    /// Pass `--reload` to the ASGI server
    #[serde(default = "default_true")]
    pub reload: bool,
    /// Rust builder image (native variant)
    #[serde(default = "default_builder_image")]
    pub builder_image: String,
    /// Runtime base image (native variant)
    #[serde(default = "default_runtime_image")]
    pub runtime_image: String,
    /// Cargo Chef version (native variant)
    #[serde(default = "default_cargo_chef_version")]
    pub cargo_chef_version: String,
    /// Static environment variables baked into the image as ENV directives.
    /// Ordered so rendering stays deterministic.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Which container recipe to generate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// `python3 app.py`, no working directory
    Script,
    /// ASGI server under `/app` with auto-reload
    #[default]
    Asgi,
    /// Multi-stage cargo-chef build of the keeper binary
    Native,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Script, Variant::Asgi, Variant::Native];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Script => "script",
            Variant::Asgi => "asgi",
            Variant::Native => "native",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::UnknownVariant(s.to_owned()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route_prefix: default_route_prefix(),
            static_dir: default_static_dir(),
            url_secret: None,
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
            token_cache: default_token_cache(),
            compute_url: default_compute_url(),
            iam_url: default_iam_url(),
            request_timeout_secs: default_request_timeout_secs(),
            refresh_margin_secs: default_refresh_margin_secs(),
        }
    }
}

impl Default for AutoStartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            page_size: default_page_size(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            base_image: default_base_image(),
            manifest: default_manifest(),
            workdir: default_workdir(),
            script: default_script(),
            app_target: default_app_target(),
            reload: true,
            builder_image: default_builder_image(),
            runtime_image: default_runtime_image(),
            cargo_chef_version: default_cargo_chef_version(),
            env: BTreeMap::new(),
        }
    }
}

impl KeeperConfig {
    /// Load from keeper.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.clone(),
                source: e,
            })?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        let prefix = &self.server.route_prefix;
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(crate::Error::InvalidConfig {
                field: "server.route_prefix",
                reason: "must start with '/' and must not end with '/'",
            });
        }
        if let Some(secret) = &self.server.url_secret {
            validate_url_secret(secret)?;
        }
        if self.autostart.interval_secs == 0 {
            return Err(crate::Error::InvalidConfig {
                field: "autostart.interval_secs",
                reason: "must be greater than zero",
            });
        }
        if self.autostart.page_size == 0 {
            return Err(crate::Error::InvalidConfig {
                field: "autostart.page_size",
                reason: "must be greater than zero",
            });
        }
        if self.cloud.request_timeout_secs == 0 {
            return Err(crate::Error::InvalidConfig {
                field: "cloud.request_timeout_secs",
                reason: "must be greater than zero",
            });
        }
        if self.cloud.refresh_margin_secs < 0 {
            return Err(crate::Error::InvalidConfig {
                field: "cloud.refresh_margin_secs",
                reason: "must not be negative",
            });
        }
        Ok(())
    }
}

/// A URL secret is a single, non-empty path segment.
pub fn validate_url_secret(secret: &str) -> crate::Result<()> {
    if secret.is_empty() {
        return Err(crate::Error::InvalidUrlSecret("must not be empty"));
    }
    if secret
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#' | '{' | '}' | '*') || c.is_whitespace())
    {
        return Err(crate::Error::InvalidUrlSecret(
            "must be a single path segment without '/', '?', '#', braces, '*' or whitespace",
        ));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    5777
}

fn default_route_prefix() -> String {
    "/yapi".to_owned()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_key_file() -> PathBuf {
    PathBuf::from("authorized_key.json")
}

fn default_token_cache() -> PathBuf {
    PathBuf::from("jwt_cache.json")
}

fn default_compute_url() -> String {
    "https://compute.api.cloud.yandex.net/compute/v1".to_owned()
}

fn default_iam_url() -> String {
    "https://iam.api.cloud.yandex.net/iam/v1/tokens".to_owned()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_refresh_margin_secs() -> i64 {
    300
}

fn default_interval_secs() -> u64 {
    60
}

fn default_page_size() -> u32 {
    50
}

fn default_base_image() -> String {
    "python:3.12-slim".to_owned()
}

fn default_manifest() -> String {
    "requirements.txt".to_owned()
}

fn default_workdir() -> String {
    "/app".to_owned()
}

fn default_script() -> String {
    "app.py".to_owned()
}

fn default_app_target() -> String {
    "app:app".to_owned()
}

fn default_builder_image() -> String {
    "rust:1.85-bookworm".to_owned()
}

fn default_runtime_image() -> String {
    "gcr.io/distroless/cc-debian12".to_owned()
}

fn default_cargo_chef_version() -> String {
    "0.1.68".to_owned()
}
