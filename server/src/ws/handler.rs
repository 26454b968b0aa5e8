use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use serde::Deserialize;

use crate::state::AppState;
use crate::ws::actor;

/// Query parameters for WebSocket connection. The user id is supplied by the
/// transport layer as `?userId=...` and treated as an opaque string.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Policy violation close code (RFC 6455) used when the identity is missing.
const CLOSE_POLICY_VIOLATION: u16 = 1008;

const MISSING_USER_ID_REASON: &str = "User ID is required for connection";

/// GET /ws?userId=<id>
/// WebSocket upgrade endpoint. A missing or empty user id is rejected after
/// the upgrade with close code 1008, before any message is dispatched.
/// On success, spawns an actor for the connection.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    match params.user_id.filter(|id| !id.is_empty()) {
        Some(user_id) => {
            tracing::info!(user_id = %user_id, "WebSocket connection identified");
            ws.on_upgrade(move |socket| handle_identified(socket, state, user_id))
        }
        None => {
            tracing::warn!(
                close_code = CLOSE_POLICY_VIOLATION,
                "WebSocket connection rejected: no user id"
            );

            // Upgrade the connection, then immediately close with the policy code
            ws.on_upgrade(move |mut socket: WebSocket| async move {
                let close_frame = CloseFrame {
                    code: CLOSE_POLICY_VIOLATION,
                    reason: MISSING_USER_ID_REASON.into(),
                };
                let _ = socket.send(Message::Close(Some(close_frame))).await;
            })
        }
    }
}

/// Handle an identified WebSocket connection by running the actor.
async fn handle_identified(socket: WebSocket, state: AppState, user_id: String) {
    actor::run_connection(socket, state, user_id).await;
}
