//! Readiness checks behind `keeper doctor`.

use std::fmt;
use std::path::Path;

use keeper_core::config::CONFIG_FILE;
use keeper_core::{KeeperConfig, ServiceAccountKey, resolve_url_secret};

use crate::compute::http_client;
use crate::iam::{IamClient, TokenIssuer};

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub config_file: CheckResult,
    pub key_file: CheckResult,
    pub url_secret: CheckResult,
    pub static_dir: CheckResult,
    pub iam_token: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.checks().iter().all(|(_, c)| c.passed)
    }

    fn checks(&self) -> [(&'static str, &CheckResult); 5] {
        [
            ("Config file", &self.config_file),
            ("Key file", &self.key_file),
            ("URL secret", &self.url_secret),
            ("Static dir", &self.static_dir),
            ("IAM token", &self.iam_token),
        ]
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Keeper Doctor")?;
        writeln!(f, "-------------")?;
        for (name, check) in self.checks() {
            writeln!(f, "{:<12} [{}] {}", name, check.icon(), check.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

/// Run every check against the project in `project_dir`.
///
/// Relative paths in keeper.toml are resolved against `project_dir`.
/// `env_secret` is the value of the URL-secret environment variable.
pub async fn doctor(project_dir: &Path, env_secret: Option<String>) -> DoctorReport {
    let mut report = DoctorReport::default();

    let config = match KeeperConfig::load(project_dir) {
        Ok(config) => {
            report.config_file = if project_dir.join(CONFIG_FILE).exists() {
                CheckResult::ok("Found")
            } else {
                CheckResult::ok("Not found, using defaults")
            };
            config
        }
        Err(e) => {
            report.config_file = CheckResult::fail(&e.to_string());
            KeeperConfig::default()
        }
    };

    let static_dir = project_dir.join(&config.server.static_dir);
    report.static_dir = if static_dir.join("index.html").is_file() {
        CheckResult::ok(&static_dir.display().to_string())
    } else {
        CheckResult::fail(&format!("{} has no index.html", static_dir.display()))
    };

    let key = match ServiceAccountKey::load(&project_dir.join(&config.cloud.key_file)) {
        Ok(key) => {
            report.key_file = CheckResult::ok(&format!("folder {}", key.folder_id));
            key
        }
        Err(e) => {
            report.key_file = CheckResult::fail(&e.to_string());
            report.url_secret = CheckResult::fail("skipped: key file unavailable");
            report.iam_token = CheckResult::fail("skipped: key file unavailable");
            return report;
        }
    };

    report.url_secret = match resolve_url_secret(env_secret, &config.server, &key) {
        Ok(_) => CheckResult::ok("Configured"),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    report.iam_token = match http_client(config.cloud.request_timeout_secs) {
        Ok(http) => {
            let issuer = IamClient::new(http, config.cloud.iam_url.clone(), key);
            match issuer.issue().await {
                Ok(token) => CheckResult::ok(&format!("Issued, expires at {}", token.expires_at)),
                Err(e) => CheckResult::fail(&e.to_string()),
            }
        }
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    report
}
