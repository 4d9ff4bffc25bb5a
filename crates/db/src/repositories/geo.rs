use async_trait::async_trait;

use ticketroute_core::routing::ports::{GeoQuery, PortError};

use super::RepositoryError;
use crate::DbPool;

/// Team-to-location distances. Unknown pairs are errors so the nearest
/// strategy deprioritizes them.
pub struct SqlGeoQuery {
    pool: DbPool,
}

impl SqlGeoQuery {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_distance(
        &self,
        team_id: &str,
        location_id: &str,
    ) -> Result<Option<f64>, RepositoryError> {
        let distance = sqlx::query_scalar(
            "SELECT distance FROM team_distance WHERE team_id = ? AND location_id = ?",
        )
        .bind(team_id)
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(distance)
    }
}

#[async_trait]
impl GeoQuery for SqlGeoQuery {
    async fn distance(&self, team_id: &str, location_id: Option<&str>) -> Result<f64, PortError> {
        let Some(location_id) = location_id else {
            return Err(PortError::Backend(format!(
                "no location given for distance of team `{team_id}`"
            )));
        };

        self.fetch_distance(team_id, location_id).await?.ok_or_else(|| {
            PortError::Backend(format!(
                "no distance recorded for team `{team_id}` at location `{location_id}`"
            ))
        })
    }
}
