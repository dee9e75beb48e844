//! Core types and configuration for keeper.
//!
//! This crate defines the `keeper.toml` schema ([`KeeperConfig`]), the
//! service-account key file ([`ServiceAccountKey`]), the Compute
//! instance model ([`Instance`], [`InstanceSummary`]), and shared error
//! types.

pub mod config;
pub mod credentials;
pub mod error;
pub mod instance;
pub mod time;

pub use config::{
    AutoStartConfig, BuildConfig, CloudConfig, KeeperConfig, ServerConfig, Variant,
};
pub use credentials::{ServiceAccountKey, URL_SECRET_ENV, resolve_url_secret};
pub use error::{Error, Result};
pub use instance::{Instance, InstancePage, InstanceSummary, Operation};
