use axum::{Json, Router};

use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// GET / — status document, mirrors what deployment probes expect.
async fn status(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "WebSocket Server is running!",
        "connections": state.connections.len(),
    }))
}

/// Basic health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

/// Build the full axum Router.
pub fn build_router(state: AppState) -> Router {
    // WebSocket endpoint (identity via query param)
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    let status_routes = Router::new()
        .route("/", axum::routing::get(status))
        .route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(ws_routes)
        .merge(status_routes)
        .with_state(state)
}
