use crate::ws::ConnectionRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone, Default)]
pub struct AppState {
    /// Active WebSocket connections, one per user id.
    pub connections: ConnectionRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            connections: ConnectionRegistry::new(),
        }
    }
}
