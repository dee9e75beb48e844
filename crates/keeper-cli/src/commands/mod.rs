mod autostart;
mod dockerfile;
mod doctor;
mod eject;
mod instances;
mod serve;

use std::path::Path;

use anyhow::Context;
use keeper_cloud::ComputeClient;
use keeper_core::{KeeperConfig, ServiceAccountKey, URL_SECRET_ENV, Variant};

pub use autostart::auto_start;
pub use dockerfile::dockerfile;
pub use doctor::doctor;
pub use eject::eject;
pub use instances::instances;
pub use serve::serve;

/// Value of the URL-secret override, if set.
pub(crate) fn env_url_secret() -> Option<String> {
    std::env::var(URL_SECRET_ENV)
        // arch-lint: allow(no-silent-result-drop) reason="an unset variable means the secret comes from keeper.toml or the key file"
        .ok()
}

pub(crate) fn load_config() -> anyhow::Result<KeeperConfig> {
    Ok(KeeperConfig::load(Path::new("."))?)
}

pub(crate) fn load_key(config: &KeeperConfig) -> anyhow::Result<ServiceAccountKey> {
    ServiceAccountKey::load(&config.cloud.key_file).with_context(|| {
        format!(
            "a service-account key is required; set cloud.key_file in keeper.toml (currently {})",
            config.cloud.key_file.display()
        )
    })
}

pub(crate) fn compute_client(config: &KeeperConfig) -> anyhow::Result<ComputeClient> {
    let key = load_key(config)?;
    Ok(ComputeClient::from_config(&config.cloud, key)?)
}

/// Render the Dockerfile for `variant`, defaulting to the configured one.
pub(crate) fn render_dockerfile(
    config: &KeeperConfig,
    variant: Option<Variant>,
) -> anyhow::Result<String> {
    let mut build = config.build.clone();
    if let Some(variant) = variant {
        build.variant = variant;
    }
    let generator = keeper_build::DockerfileGenerator::new(&build, config.server.port);
    generator
        .render()
        .with_context(|| format!("invalid {} recipe", build.variant))
}
