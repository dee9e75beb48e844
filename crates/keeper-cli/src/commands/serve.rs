use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use keeper::{AppState, Scheduler, router, stop_after};
use keeper_cloud::{ComputeApi, ComputeClient};
use keeper_core::resolve_url_secret;

use super::{env_url_secret, load_config, load_key};

pub async fn serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let config = load_config()?;
    let key = load_key(&config)?;
    let secret = resolve_url_secret(env_url_secret(), &config.server, &key)?;

    let static_dir = &config.server.static_dir;
    std::fs::create_dir_all(static_dir)
        .with_context(|| format!("failed to create {}", static_dir.display()))?;

    let folder_id = key.folder_id.clone();
    let compute: Arc<dyn ComputeApi> = Arc::new(ComputeClient::from_config(&config.cloud, key)?);
    let state = AppState::new(Arc::clone(&compute), folder_id, &config);
    let app = router(state, &config.server.route_prefix, &secret);

    let scheduler = if config.autostart.enabled {
        Some(Scheduler::spawn(
            compute,
            Duration::from_secs(config.autostart.interval_secs),
            config.autostart.page_size,
        ))
    } else {
        tracing::info!("auto-start scheduler disabled");
        None
    };

    let addr = format!(
        "{}:{}",
        host.as_deref().unwrap_or(&config.server.host),
        port.unwrap_or(config.server.port)
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, prefix = %config.server.route_prefix, "keeper listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    stop_after(scheduler, server).await.context("server error")?;
    tracing::info!("keeper stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received, draining connections");
}
