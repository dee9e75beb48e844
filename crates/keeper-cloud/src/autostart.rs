use keeper_core::Instance;
use serde::{Deserialize, Serialize};

use crate::compute::ComputeApi;
use crate::error::ComputeError;

/// Upper bound on pages followed in one listing.
pub const MAX_PAGES: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoStartReport {
    pub started: Vec<StartedInstance>,
    pub failed: Vec<FailedInstance>,
    pub total_stopped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartedInstance {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedInstance {
    pub id: String,
    pub name: String,
    pub error: String,
}

/// Every instance in the folder, following `nextPageToken` to the end.
pub async fn list_all(api: &dyn ComputeApi, page_size: u32) -> Result<Vec<Instance>, ComputeError> {
    let mut instances = Vec::new();
    let mut token: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let page = api.list_instances(page_size, token.take()).await?;
        let next = page.next_token().map(str::to_owned);
        let parsed = page
            .parse_instances()
            .map_err(|e| ComputeError::Instance { source: e })?;
        instances.extend(parsed);
        match next {
            Some(next) => token = Some(next),
            None => return Ok(instances),
        }
    }

    Err(ComputeError::Pagination { pages: MAX_PAGES })
}

/// Start every instance whose status is `STOPPED`.
///
/// Never fails: a listing error yields an empty report carrying the
/// error text, and per-instance failures are collected in `failed`.
pub async fn auto_start_stopped(api: &dyn ComputeApi, page_size: u32) -> AutoStartReport {
    tracing::info!("running auto-start check for stopped instances");

    let instances = match list_all(api, page_size).await {
        Ok(instances) => instances,
        Err(e) => {
            tracing::error!(error = %e.detail(), "auto-start check failed");
            return AutoStartReport {
                error: Some(e.detail()),
                ..Default::default()
            };
        }
    };

    let stopped: Vec<&Instance> = instances.iter().filter(|i| i.is_stopped()).collect();
    let mut report = AutoStartReport {
        total_stopped: stopped.len(),
        ..Default::default()
    };

    for instance in stopped {
        let name = instance.display_name().to_owned();
        match api.start_instance(&instance.id).await {
            Ok(_) => {
                tracing::info!(id = %instance.id, %name, "auto-started instance");
                report.started.push(StartedInstance {
                    id: instance.id.clone(),
                    name,
                });
            }
            Err(e) => {
                tracing::error!(id = %instance.id, %name, error = %e.detail(), "failed to auto-start instance");
                report.failed.push(FailedInstance {
                    id: instance.id.clone(),
                    name,
                    error: e.detail(),
                });
            }
        }
    }

    tracing::info!(
        total_stopped = report.total_stopped,
        started = report.started.len(),
        failed = report.failed.len(),
        "auto-start check finished"
    );
    report
}
