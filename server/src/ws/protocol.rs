use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;
use crate::ws::{Connection, ConnectionSender};

/// Inbound client event. Internally tagged on the `event` field; any
/// unrecognized tag lands in `Unknown` so the dispatch match stays exhaustive.
/// Payloads are opaque to the server and forwarded as-is.
#[derive(Debug, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    #[serde(rename = "greet")]
    Greet,
    #[serde(rename = "echo")]
    Echo {
        #[serde(default)]
        payload: Value,
    },
    #[serde(rename = "sendToUser")]
    SendToUser {
        #[serde(rename = "targetUserId")]
        target_user_id: String,
        #[serde(default)]
        payload: Value,
    },
    #[serde(rename = "broadcast")]
    Broadcast {
        #[serde(default)]
        payload: Value,
    },
    #[serde(other)]
    Unknown,
}

/// Handle one incoming text frame: decode the event and dispatch it.
/// Every failure mode replies to the sender only and leaves the connection
/// open; nothing here can take down another connection or the dispatch loop.
pub fn handle_text_message(text: &str, tx: &ConnectionSender, state: &AppState, user_id: &str) {
    // "Invalid message format" is reserved for frames that are not JSON at
    // all. Well-formed JSON without a usable `event` tag falls through to the
    // Unknown arm, like a switch default.
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Failed to parse inbound message"
            );
            reply(tx, "Invalid message format");
            return;
        }
    };

    let event = serde_json::from_value::<Event>(value).unwrap_or(Event::Unknown);

    tracing::debug!(user_id = %user_id, event = ?event, "Dispatching event");

    match event {
        Event::Greet => {
            reply(tx, "Hello, Client!");
        }
        Event::Echo { payload } => {
            reply(tx, &format!("Echo: {}", render_payload(&payload)));
        }
        Event::SendToUser {
            target_user_id,
            payload,
        } => {
            handle_send_to_user(state, tx, user_id, &target_user_id, payload);
        }
        Event::Broadcast { payload } => {
            handle_broadcast(state, &payload);
        }
        Event::Unknown => {
            reply(tx, "Unknown event");
        }
    }
}

/// Unicast: deliver the payload to the target user only. An absent or
/// no-longer-open target is a normal outcome, reported back to the sender.
fn handle_send_to_user(
    state: &AppState,
    tx: &ConnectionSender,
    sender_id: &str,
    target_user_id: &str,
    payload: Value,
) {
    match state.connections.lookup(target_user_id) {
        Some(target) if target.is_open() => {
            let envelope = json!({ "from": sender_id, "message": payload });
            if !target.send_text(envelope.to_string()) {
                // Target closed between lookup and send.
                reply(tx, &format!("User {} is not online", target_user_id));
            }
        }
        _ => {
            reply(tx, &format!("User {} is not online", target_user_id));
        }
    }
}

/// Fan the payload out to every open connection, the sender included.
/// Each recipient's send is independent; a dead one is skipped.
fn handle_broadcast(state: &AppState, payload: &Value) {
    let text = render_payload(payload);
    state.connections.for_each(|user_id, conn: &Connection| {
        if conn.is_open() && !conn.send_text(text.clone()) {
            tracing::debug!(user_id = %user_id, "Broadcast recipient gone, skipping");
        }
    });
}

/// Render an opaque payload as frame text: string payloads go out verbatim,
/// everything else in its JSON form.
pub fn render_payload(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn reply(tx: &ConnectionSender, text: &str) {
    let _ = tx.send(axum::extract::ws::Message::Text(text.to_string().into()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_greet_regardless_of_payload() {
        assert!(matches!(
            serde_json::from_str::<Event>(r#"{"event":"greet"}"#).unwrap(),
            Event::Greet
        ));
        assert!(matches!(
            serde_json::from_str::<Event>(r#"{"event":"greet","payload":"ignored"}"#).unwrap(),
            Event::Greet
        ));
    }

    #[test]
    fn decodes_echo_with_payload() {
        let event = serde_json::from_str::<Event>(r#"{"event":"echo","payload":"hi"}"#).unwrap();
        match event {
            Event::Echo { payload } => assert_eq!(payload, json!("hi")),
            other => panic!("expected Echo, got {:?}", other),
        }
    }

    #[test]
    fn decodes_send_to_user() {
        let event = serde_json::from_str::<Event>(
            r#"{"event":"sendToUser","targetUserId":"B","payload":"hi"}"#,
        )
        .unwrap();
        match event {
            Event::SendToUser {
                target_user_id,
                payload,
            } => {
                assert_eq!(target_user_id, "B");
                assert_eq!(payload, json!("hi"));
            }
            other => panic!("expected SendToUser, got {:?}", other),
        }
    }

    #[test]
    fn decodes_broadcast_with_missing_payload_as_null() {
        let event = serde_json::from_str::<Event>(r#"{"event":"broadcast"}"#).unwrap();
        match event {
            Event::Broadcast { payload } => assert_eq!(payload, Value::Null),
            other => panic!("expected Broadcast, got {:?}", other),
        }
    }

    #[test]
    fn unrecognized_event_kind_decodes_to_unknown() {
        assert!(matches!(
            serde_json::from_str::<Event>(r#"{"event":"dance","payload":1}"#).unwrap(),
            Event::Unknown
        ));
    }

    fn dispatch_and_read_reply(text: &str) -> String {
        let state = AppState::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        handle_text_message(text, &tx, &state, "A");
        match rx.try_recv().expect("expected a reply") {
            axum::extract::ws::Message::Text(reply) => reply.to_string(),
            other => panic!("expected text reply, got {:?}", other),
        }
    }

    #[test]
    fn non_json_input_replies_invalid_format() {
        assert_eq!(dispatch_and_read_reply("this is not json"), "Invalid message format");
    }

    #[test]
    fn missing_event_field_dispatches_as_unknown() {
        assert_eq!(
            dispatch_and_read_reply(r#"{"payload":"no event field"}"#),
            "Unknown event"
        );
    }

    #[test]
    fn non_string_event_tag_dispatches_as_unknown() {
        assert_eq!(dispatch_and_read_reply(r#"{"event":5}"#), "Unknown event");
        assert_eq!(
            dispatch_and_read_reply(r#"{"event":null,"payload":"x"}"#),
            "Unknown event"
        );
    }

    #[test]
    fn render_payload_keeps_strings_verbatim() {
        assert_eq!(render_payload(&json!("hi")), "hi");
        assert_eq!(render_payload(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(render_payload(&json!(42)), "42");
        assert_eq!(render_payload(&Value::Null), "null");
    }
}
