use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use keeper_cloud::ComputeApi;
use keeper_core::KeeperConfig;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub compute: Arc<dyn ComputeApi>,
    pub folder_id: String,
    /// Directory holding `index.html`, `default.html`, `404.html` and assets
    pub static_dir: PathBuf,
    /// Page size used when a handler walks every page
    pub page_size: u32,
    pub started_at: DateTime<Utc>,
    pub version: &'static str,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("folder_id", &self.folder_id)
            .field("static_dir", &self.static_dir)
            .field("page_size", &self.page_size)
            .field("started_at", &self.started_at)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(compute: Arc<dyn ComputeApi>, folder_id: String, config: &KeeperConfig) -> Self {
        Self {
            compute,
            folder_id,
            static_dir: config.server.static_dir.clone(),
            page_size: config.autostart.page_size,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
