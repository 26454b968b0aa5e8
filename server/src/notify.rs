//! Notification gateway: the one path by which internal application logic
//! pushes a message to a connected user. Fire-and-forget — there is no return
//! channel and no result to consume.

use serde_json::{json, Value};

use crate::ws::ConnectionRegistry;

/// Deliver `{"type": "notification", "message": <message>}` to the target
/// user's connection. An absent or no-longer-open target is a normal outcome,
/// logged and dropped.
pub fn notify(registry: &ConnectionRegistry, target_user_id: &str, message: Value) {
    match registry.lookup(target_user_id) {
        Some(conn) if conn.is_open() => {
            let envelope = json!({ "type": "notification", "message": message });
            if !conn.send_text(envelope.to_string()) {
                tracing::info!(user_id = %target_user_id, "Notification target closed mid-send");
            }
        }
        _ => {
            tracing::info!(user_id = %target_user_id, "Notification target is not online");
        }
    }
}
