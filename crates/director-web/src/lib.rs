//! Director Web
//!
//! Axum-based HTTP API: turn processing, node execution, browser session
//! lifecycle, workflow snapshots, and SSE tool-call fan-out.

pub mod routes;
pub mod sse;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use director_db::DbPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/director/process", post(routes::director::process))
        .route("/director/tool-stream", get(sse::tool_stream))
        .route("/nodes/execute", post(routes::nodes::execute))
        .route("/execution/start", post(routes::execution::start))
        .route("/execution/stop", post(routes::execution::stop))
        .route("/workflows/{id}", get(routes::workflows::get_workflow))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(db: Arc<DbPool>, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(db);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Director web server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}
