use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;

pub mod postgres;

pub use postgres::PostgresGateway;

/// Durable message record, immutable once written.
///
/// `content` and `iv` are opaque to the relay and the storage layer; clients
/// encrypt and decrypt. `sequence_number` is the server-assigned per-chat
/// monotonic position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedMessage {
    pub id: Uuid,
    pub chat_id: String,
    pub sender: String,
    pub content: String,
    pub iv: String,
    pub sequence_number: i64,
    pub created_at: DateTime<Utc>,
}

/// Boundary to the storage service: a message is durably written before any
/// member sees its broadcast.
///
/// The relay core depends only on this trait, so tests drive sessions with a
/// recording or failing fake instead of a database.
#[async_trait]
pub trait DurabilityGateway: Send + Sync {
    async fn persist(
        &self,
        chat_id: &str,
        sender: &str,
        content: &str,
        iv: &str,
    ) -> AppResult<PersistedMessage>;
}
