use axum::Router;
use axum::handler::Handler;
use axum::routing::{get, post};
use secrecy::{ExposeSecret, SecretString};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router.
///
/// Public routes live under `prefix`; the dashboard and API are mounted
/// under `{prefix}/{secret}`. Unknown paths get the 404 page.
pub fn router(state: AppState, prefix: &str, secret: &SecretString) -> Router {
    let prefix = prefix.trim_end_matches('/');
    let base = format!("{prefix}/{}", secret.expose_secret());

    let assets = ServeDir::new(&state.static_dir)
        .not_found_service(handlers::not_found.with_state(state.clone()));

    tracing::info!(%prefix, static_dir = %state.static_dir.display(), "routes mounted");

    Router::new()
        .route(&format!("{prefix}/"), get(handlers::default_page))
        .route(&format!("{prefix}/robots.txt"), get(handlers::robots))
        .route(&base, get(handlers::add_trailing_slash))
        .route(&format!("{base}/"), get(handlers::dashboard))
        .nest_service(&format!("{base}/static"), assets)
        .route(
            &format!("{base}/api/instances"),
            get(handlers::list_instances),
        )
        .route(
            &format!("{base}/api/instances/summary"),
            get(handlers::instance_summaries),
        )
        .route(
            &format!("{base}/api/instances/{{id}}/start"),
            post(handlers::start_instance),
        )
        .route(
            &format!("{base}/api/instances/{{id}}/stop"),
            post(handlers::stop_instance),
        )
        .route(&format!("{base}/api/status"), get(handlers::status))
        .route(&format!("{base}/api/auto-start"), post(handlers::auto_start))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
