use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::storage::{DurabilityGateway, PersistedMessage};

/// Postgres-backed durability gateway.
///
/// One INSERT per message; the `chat_counters` CTE hands out the per-chat
/// sequence number in the same statement, so concurrent senders get distinct,
/// monotonic positions without a second round trip.
pub struct PostgresGateway {
    db: Pool,
}

impl PostgresGateway {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DurabilityGateway for PostgresGateway {
    async fn persist(
        &self,
        chat_id: &str,
        sender: &str,
        content: &str,
        iv: &str,
    ) -> AppResult<PersistedMessage> {
        let id = Uuid::new_v4();

        let client = self
            .db
            .get()
            .await
            .map_err(|e| AppError::Persistence(format!("get client: {e}")))?;

        let row = client
            .query_one(
                r#"
                WITH next AS (
                    INSERT INTO chat_counters (chat_id, last_seq)
                    VALUES ($2, 1)
                    ON CONFLICT (chat_id)
                    DO UPDATE SET last_seq = chat_counters.last_seq + 1
                    RETURNING last_seq
                )
                INSERT INTO messages (
                    id,
                    chat_id,
                    sender,
                    content,
                    iv,
                    sequence_number
                )
                SELECT
                    $1,
                    $2,
                    $3,
                    $4,
                    $5,
                    next.last_seq
                FROM next
                RETURNING id, chat_id, sender, content, iv, sequence_number, created_at
                "#,
                &[&id, &chat_id, &sender, &content, &iv],
            )
            .await
            .map_err(|e| AppError::Persistence(format!("insert message: {e}")))?;

        Ok(PersistedMessage {
            id: row.get(0),
            chat_id: row.get(1),
            sender: row.get(2),
            content: row.get(3),
            iv: row.get(4),
            sequence_number: row.get(5),
            created_at: row.get(6),
        })
    }
}
