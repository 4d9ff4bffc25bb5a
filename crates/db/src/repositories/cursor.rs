use async_trait::async_trait;

use ticketroute_core::routing::ports::{PortError, RoundRobinCursor};

use super::RepositoryError;
use crate::DbPool;

/// Round-robin cursor shared by every process using the same database.
/// Each advance is a single upsert, so concurrent pickers never reuse an
/// offset.
pub struct SqlRoundRobinCursor {
    pool: DbPool,
}

impl SqlRoundRobinCursor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn bump(&self, key: &str, len: i64) -> Result<i64, RepositoryError> {
        let stored: i64 = sqlx::query_scalar(
            "INSERT INTO round_robin_cursor (cursor_key, position)
             VALUES (?1, 1 % ?2)
             ON CONFLICT(cursor_key) DO UPDATE
                 SET position = (round_robin_cursor.position + 1) % ?2
             RETURNING position",
        )
        .bind(key)
        .bind(len)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }
}

#[async_trait]
impl RoundRobinCursor for SqlRoundRobinCursor {
    async fn advance(&self, key: &str, len: usize) -> Result<usize, PortError> {
        if len == 0 {
            return Ok(0);
        }
        let len = i64::try_from(len)
            .map_err(|_| PortError::Backend("candidate list too long for cursor".to_string()))?;

        let stored = self.bump(key, len).await?;
        // `stored` is the position after this pick; the offset used is the one before it.
        let offset = (stored - 1).rem_euclid(len);
        usize::try_from(offset).map_err(|error| PortError::Decode(error.to_string()))
    }
}
