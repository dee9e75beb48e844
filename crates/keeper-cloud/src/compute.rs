use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keeper_core::{CloudConfig, InstancePage, Operation, ServiceAccountKey};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::cache::TokenCache;
use crate::error::ComputeError;
use crate::iam::IamClient;
use crate::token::{CachedTokenProvider, TokenSource};

/// Instance operations Keeper needs, parameterized for testability.
///
/// Production code uses [`ComputeClient`]; tests use mockall mocks.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn list_instances(
        &self,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<InstancePage, ComputeError>;

    async fn start_instance(&self, instance_id: &str) -> Result<Operation, ComputeError>;

    async fn stop_instance(&self, instance_id: &str) -> Result<Operation, ComputeError>;
}

/// Compute REST API client.
pub struct ComputeClient {
    http: reqwest::Client,
    base_url: String,
    folder_id: String,
    tokens: Arc<dyn TokenSource>,
}

/// HTTP client shared by the IAM and Compute clients.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

impl ComputeClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        folder_id: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let folder_id = folder_id.into();
        tracing::info!(%folder_id, %base_url, "compute client initialized");
        Self {
            http,
            base_url,
            folder_id,
            tokens,
        }
    }

    /// Wire up IAM issuance, the token cache and the Compute client from config.
    pub fn from_config(config: &CloudConfig, key: ServiceAccountKey) -> Result<Self, ComputeError> {
        let http = http_client(config.request_timeout_secs)
            .map_err(|e| ComputeError::Request { source: e })?;
        let folder_id = key.folder_id.clone();
        let issuer = IamClient::new(http.clone(), config.iam_url.clone(), key);
        let tokens = CachedTokenProvider::new(
            Arc::new(issuer),
            TokenCache::new(&config.token_cache),
            config.refresh_margin_secs,
        );
        Ok(Self::new(
            http,
            config.compute_url.clone(),
            folder_id,
            Arc::new(tokens),
        ))
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ComputeError> {
        let token = self.tokens.token().await?;
        let response = request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| ComputeError::Request { source: e })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            tracing::error!(status = status.as_u16(), %body, "compute request failed");
            return Err(ComputeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "compute request succeeded");
        response
            .json()
            .await
            .map_err(|e| ComputeError::Decode { source: e })
    }

    async fn instance_action(
        &self,
        instance_id: &str,
        action: &str,
    ) -> Result<Operation, ComputeError> {
        validate_instance_id(instance_id)?;
        let url = format!("{}/instances/{instance_id}:{action}", self.base_url);
        tracing::info!(%instance_id, action, "requesting instance operation");
        let operation: Operation = self.send(self.http.post(url)).await?;
        tracing::info!(
            %instance_id,
            action,
            operation_id = operation.id.as_deref().unwrap_or("-"),
            "instance operation initiated"
        );
        Ok(operation)
    }
}

#[async_trait]
impl ComputeApi for ComputeClient {
    async fn list_instances(
        &self,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<InstancePage, ComputeError> {
        let mut query = vec![
            ("folderId", self.folder_id.clone()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            query.push(("pageToken", token));
        }

        let url = format!("{}/instances", self.base_url);
        tracing::debug!(%url, page_size, "listing instances");
        self.send(self.http.get(url).query(&query)).await
    }

    async fn start_instance(&self, instance_id: &str) -> Result<Operation, ComputeError> {
        self.instance_action(instance_id, "start").await
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<Operation, ComputeError> {
        self.instance_action(instance_id, "stop").await
    }
}

/// Instance ids are path segments; reject anything that could reshape the URL.
fn validate_instance_id(instance_id: &str) -> Result<(), ComputeError> {
    let valid = !instance_id.is_empty()
        && instance_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ComputeError::InvalidInstanceId(instance_id.to_owned()))
    }
}
