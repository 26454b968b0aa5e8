pub mod actor;
pub mod handler;
pub mod protocol;
pub mod registry;

use tokio::sync::mpsc;

/// Sender half of a WebSocket connection's channel. Anything holding a clone
/// can push messages to that client; the connection's writer task owns the
/// receiving end.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

pub use registry::{Connection, ConnectionRegistry};
