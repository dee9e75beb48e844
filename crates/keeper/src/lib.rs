//! Secret-URL dashboard and auto-start service for Yandex Cloud Compute.
//!
//! This crate serves the HTTP surface and the background auto-start loop,
//! and re-exports the other Keeper crates.
//!
//! | Module | Crate | Description |
//! |--------|-------|-------------|
//! | root | [`keeper-core`](https://crates.io/crates/keeper-core) | Configuration, key file, instance model |
//! | [`cloud`] | [`keeper-cloud`](https://crates.io/crates/keeper-cloud) | IAM tokens, Compute API, auto-start |
//! | `build` | [`keeper-build`](https://crates.io/crates/keeper-build) | Dockerfile recipes (feature `build`, on by default) |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use keeper::cloud::ComputeClient;
//! use keeper::{AppState, KeeperConfig, ServiceAccountKey, router};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KeeperConfig::load(Path::new("."))?;
//! let key = ServiceAccountKey::load(&config.cloud.key_file)?;
//! let secret = keeper::resolve_url_secret(None, &config.server, &key)?;
//! let folder_id = key.folder_id.clone();
//! let compute = ComputeClient::from_config(&config.cloud, key)?;
//!
//! let state = AppState::new(Arc::new(compute), folder_id, &config);
//! let app = router(state, &config.server.route_prefix, &secret);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5777").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod router;
pub mod scheduler;
pub mod state;

pub use error::ApiError;
pub use router::router;
pub use scheduler::{Scheduler, stop_after};
pub use state::AppState;

// Core types flattened into root namespace for convenience.
pub use keeper_core::*;

/// IAM token handling, the Compute API client and auto-start.
pub mod cloud {
    pub use keeper_cloud::*;
}

/// Dockerfile recipes and eject.
#[cfg(feature = "build")]
pub mod build {
    pub use keeper_build::*;
}
