//! Request handlers for the public pages and the secret-mounted API.

use std::path::Path as FsPath;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::Utc;
use keeper_cloud::{AutoStartReport, auto_start_stopped, list_all};
use keeper_core::time::format_uptime;
use keeper_core::{InstancePage, InstanceSummary, instance::summarize};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";
pub const SERVICE_NAME: &str = "yandex-compute-api";
pub const DEFAULT_PAGE_SIZE: u32 = 50;

const DEFAULT_PAGE_FALLBACK: &str = "<h1>Default Page</h1><p>Welcome! Use the secret URL.</p>";
const DASHBOARD_FALLBACK: &str =
    "<h1>Dashboard not found</h1><p>Please ensure static/index.html exists</p>";
const NOT_FOUND_FALLBACK: &str = "<h1>404 Not Found</h1>";

/// Read `name` from the static directory, or `None` if it cannot be read.
async fn static_page(dir: &FsPath, name: &str) -> Option<String> {
    let path = dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "static page unavailable");
            None
        }
    }
}

// ── Public pages ──

pub async fn default_page(State(state): State<AppState>) -> Html<String> {
    Html(
        static_page(&state.static_dir, "default.html")
            .await
            .unwrap_or_else(|| DEFAULT_PAGE_FALLBACK.to_owned()),
    )
}

pub async fn robots() -> &'static str {
    ROBOTS_TXT
}

pub async fn not_found(State(state): State<AppState>) -> Response {
    let body = static_page(&state.static_dir, "404.html")
        .await
        .unwrap_or_else(|| NOT_FOUND_FALLBACK.to_owned());
    (StatusCode::NOT_FOUND, Html(body)).into_response()
}

// ── Dashboard ──

/// `{base}` without the slash; relative asset links need it.
pub async fn add_trailing_slash(uri: Uri) -> Redirect {
    Redirect::permanent(&format!("{}/", uri.path()))
}

pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    match static_page(&state.static_dir, "index.html").await {
        Some(page) => Html(page),
        None => {
            tracing::error!("index.html not found in static directory");
            Html(DASHBOARD_FALLBACK.to_owned())
        }
    }
}

// ── Instances ──

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

/// Instance listing as the dashboard consumes it.
///
/// Pages are relayed as the API sent them. Failures still answer 200,
/// with the error text next to an empty page.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse {
    Page(InstancePage),
    Failed {
        error: String,
        instances: Vec<Value>,
        #[serde(rename = "nextPageToken")]
        next_page_token: Option<String>,
    },
}

pub async fn list_instances(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    tracing::info!(page_size, page_token = ?query.page_token, "fetching instances");

    match state
        .compute
        .list_instances(page_size, query.page_token)
        .await
    {
        Ok(page) => {
            tracing::info!(count = page.instances.len(), "fetched instances");
            Json(ListResponse::Page(page))
        }
        Err(e) => {
            let error = e.detail();
            tracing::error!(%error, "error fetching instances");
            Json(ListResponse::Failed {
                error,
                instances: Vec::new(),
                next_page_token: None,
            })
        }
    }
}

pub async fn instance_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<InstanceSummary>>, ApiError> {
    let instances = list_all(state.compute.as_ref(), state.page_size).await?;
    Ok(Json(summarize(&instances, Utc::now())))
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    pub success: bool,
    pub operation_id: Option<String>,
    pub instance_id: String,
    pub message: String,
}

pub async fn start_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    tracing::info!(%instance_id, "start requested");
    let operation = state.compute.start_instance(&instance_id).await?;
    Ok(Json(ActionResponse {
        success: true,
        operation_id: operation.id,
        instance_id,
        message: "Instance start operation initiated".to_owned(),
    }))
}

pub async fn stop_instance(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    tracing::info!(%instance_id, "stop requested");
    let operation = state.compute.stop_instance(&instance_id).await?;
    Ok(Json(ActionResponse {
        success: true,
        operation_id: operation.id,
        instance_id,
        message: "Instance stop operation initiated".to_owned(),
    }))
}

pub async fn auto_start(State(state): State<AppState>) -> Json<AutoStartReport> {
    tracing::info!("manual auto-start triggered");
    Json(auto_start_stopped(state.compute.as_ref(), state.page_size).await)
}

// ── Status ──

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
    pub folder_id: String,
    pub service: String,
    pub version: String,
    pub uptime: String,
    pub started_at: String,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    tracing::debug!("health check requested");
    Json(StatusResponse {
        status: "healthy".to_owned(),
        folder_id: state.folder_id.clone(),
        service: SERVICE_NAME.to_owned(),
        version: state.version.to_owned(),
        uptime: format_uptime(Utc::now() - state.started_at),
        started_at: state.started_at.to_rfc3339(),
    })
}
