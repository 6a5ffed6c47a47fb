use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::error::AppResult;

/// Chat directory collaborator: answers "is this identity a member of this
/// chat?" once at session join. The relay trusts the answer.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    async fn is_member(&self, chat_id: &str, user_id: Uuid) -> AppResult<bool>;
}

pub struct PostgresChatDirectory {
    db: Pool,
}

impl PostgresChatDirectory {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatDirectory for PostgresChatDirectory {
    async fn is_member(&self, chat_id: &str, user_id: Uuid) -> AppResult<bool> {
        let client = self.db.get().await?;

        let row = client
            .query_opt(
                r#"
                SELECT 1
                FROM chat_members
                WHERE chat_id = $1
                  AND user_id = $2
                LIMIT 1
                "#,
                &[&chat_id, &user_id],
            )
            .await?;

        Ok(row.is_some())
    }
}
