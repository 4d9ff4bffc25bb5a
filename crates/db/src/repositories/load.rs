use async_trait::async_trait;

use ticketroute_core::routing::ports::{LoadQuery, PortError};

use super::RepositoryError;
use crate::DbPool;

/// Open ticket counts per team. Teams without a row have no open tickets.
pub struct SqlLoadQuery {
    pool: DbPool,
}

impl SqlLoadQuery {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_load(&self, team_id: &str) -> Result<f64, RepositoryError> {
        let open: Option<i64> =
            sqlx::query_scalar("SELECT open_tickets FROM team_open_load WHERE team_id = ?")
                .bind(team_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(open.unwrap_or(0) as f64)
    }
}

#[async_trait]
impl LoadQuery for SqlLoadQuery {
    async fn current_open_load(&self, team_id: &str) -> Result<f64, PortError> {
        Ok(self.fetch_load(team_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use ticketroute_core::routing::ports::LoadQuery;

    use super::SqlLoadQuery;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn reads_open_tickets_and_defaults_to_zero() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query("INSERT INTO team_open_load (team_id, open_tickets) VALUES ('team-a', 7)")
            .execute(&pool)
            .await
            .expect("seed");
        let query = SqlLoadQuery::new(pool);

        assert_eq!(query.current_open_load("team-a").await.expect("load"), 7.0);
        assert_eq!(query.current_open_load("team-z").await.expect("load"), 0.0);
    }
}
