use axum::extract::ws::{CloseFrame, Message};
use dashmap::DashMap;
use std::sync::Arc;

use crate::ws::ConnectionSender;

/// Handle to one live WebSocket session: the sender half of the mpsc channel
/// feeding that connection's writer task. Cloning the handle clones the
/// channel, so a clone still addresses the same underlying connection.
#[derive(Clone)]
pub struct Connection {
    tx: ConnectionSender,
}

impl Connection {
    pub fn new(tx: ConnectionSender) -> Self {
        Self { tx }
    }

    /// Whether the connection can currently accept sends. The receiving
    /// writer task drops its end of the channel on teardown, so a closed
    /// sender means the session is closing or already gone.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a message for delivery. Returns false when the connection is no
    /// longer open; never blocks and never errors out to the caller, so a
    /// dead recipient cannot abort a broadcast in progress.
    pub fn send(&self, msg: Message) -> bool {
        self.tx.send(msg).is_ok()
    }

    /// Queue a text frame for delivery.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.send(Message::Text(text.into().into()))
    }

    /// Queue a Close frame with the given code and reason.
    pub fn close(&self, code: u16, reason: &str) -> bool {
        self.send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.to_string().into(),
        })))
    }

    /// Identity equality: true when `tx` feeds the same writer task as this
    /// connection. Used to guard unregister against removing a newer
    /// connection registered under the same user id.
    pub fn same_channel(&self, tx: &ConnectionSender) -> bool {
        self.tx.same_channel(tx)
    }
}

/// Connection registry: user id -> exactly one live connection.
/// Shared across every connection task plus the notification path; DashMap
/// shard locks provide the mutual exclusion.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<DashMap<String, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the mapping for `user_id`. Last register wins: a
    /// prior connection stored under the same id becomes unreachable through
    /// the registry but is not closed here — its own actor tears it down.
    pub fn register(&self, user_id: &str, conn: Connection) {
        self.inner.insert(user_id.to_string(), conn);
        tracing::debug!(user_id = %user_id, "Connection registered");
    }

    /// Current connection for `user_id`, if any. Clones the handle out so no
    /// shard lock is held while the caller sends.
    pub fn lookup(&self, user_id: &str) -> Option<Connection> {
        self.inner.get(user_id).map(|entry| entry.value().clone())
    }

    /// Remove the mapping for `user_id` only if it still refers to the
    /// connection identified by `tx`. A stale disconnect handler racing a
    /// re-register under the same id is a no-op, as is a repeat unregister.
    pub fn unregister(&self, user_id: &str, tx: &ConnectionSender) -> bool {
        let removed = self
            .inner
            .remove_if(user_id, |_, conn| conn.same_channel(tx))
            .is_some();
        if removed {
            tracing::debug!(user_id = %user_id, "Connection unregistered");
        }
        removed
    }

    /// Visit a snapshot of all registered connections. The snapshot is taken
    /// up front, so concurrent register/unregister cannot crash the walk or
    /// expose a half-inserted entry; used for broadcast.
    pub fn for_each(&self, mut f: impl FnMut(&str, &Connection)) {
        let snapshot: Vec<(String, Connection)> = self
            .inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (user_id, conn) in &snapshot {
            f(user_id, conn);
        }
    }

    /// Number of currently registered connections.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
