use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::websocket::ConnectionId;

/// Session metadata held for the lifetime of a connection.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub chat_id: String,
    pub username: String,
}

/// Connection registry: connection id -> owning session metadata
///
/// Pure bookkeeping; fan-out lives in the [`GroupBroadcaster`].
///
/// [`GroupBroadcaster`]: crate::websocket::broadcaster::GroupBroadcaster
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<ConnectionId, SessionInfo>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Fails if the id is already present.
    pub async fn register(
        &self,
        conn_id: ConnectionId,
        chat_id: &str,
        username: &str,
    ) -> AppResult<()> {
        let mut guard = self.inner.write().await;
        match guard.entry(conn_id) {
            Entry::Occupied(_) => Err(AppError::DuplicateConnection(conn_id)),
            Entry::Vacant(slot) => {
                slot.insert(SessionInfo {
                    chat_id: chat_id.to_string(),
                    username: username.to_string(),
                });
                tracing::debug!(%conn_id, chat_id, username, "registered connection");
                Ok(())
            }
        }
    }

    /// Remove a connection. A no-op if absent, to tolerate disconnect races.
    pub async fn unregister(&self, conn_id: ConnectionId) {
        let mut guard = self.inner.write().await;
        if guard.remove(&conn_id).is_some() {
            tracing::debug!(%conn_id, "unregistered connection");
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
