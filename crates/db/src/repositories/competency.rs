use async_trait::async_trait;

use ticketroute_core::routing::ports::{CompetencyQuery, EligibilityQuery, PortError};

use super::RepositoryError;
use crate::DbPool;

/// Competency matrix lookup. NULL `time_window` and `zone` columns match any
/// window and any zone; a query without a zone only matches zone-agnostic
/// rows.
pub struct SqlCompetencyQuery {
    pool: DbPool,
}

impl SqlCompetencyQuery {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_eligible(
        &self,
        query: &EligibilityQuery<'_>,
    ) -> Result<Vec<String>, RepositoryError> {
        let teams = sqlx::query_scalar(
            "SELECT DISTINCT team_id FROM team_competency
             WHERE contract_version_id = ?1
               AND category_id = ?2
               AND (time_window IS NULL OR time_window = ?3)
               AND (zone IS NULL OR zone = ?4)
             ORDER BY team_id ASC",
        )
        .bind(&query.contract_version_id.0)
        .bind(query.category_id)
        .bind(query.window.as_str())
        .bind(query.zone)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }
}

#[async_trait]
impl CompetencyQuery for SqlCompetencyQuery {
    async fn eligible_teams(&self, query: EligibilityQuery<'_>) -> Result<Vec<String>, PortError> {
        Ok(self.fetch_eligible(&query).await?)
    }
}

#[cfg(test)]
mod tests {
    use ticketroute_core::domain::contract::ContractVersionId;
    use ticketroute_core::domain::rule::TimeWindow;
    use ticketroute_core::routing::ports::{CompetencyQuery, EligibilityQuery};

    use super::SqlCompetencyQuery;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlCompetencyQuery {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        sqlx::query(
            "INSERT INTO contract_version (id, company_id) VALUES ('cv-1', 'co-1');
             INSERT INTO team_competency (contract_version_id, category_id, team_id, time_window, zone)
             VALUES ('cv-1', 'cat-1', 'team-any', NULL, NULL),
                    ('cv-1', 'cat-1', 'team-day', 'business', NULL),
                    ('cv-1', 'cat-1', 'team-b1', NULL, 'b-1'),
                    ('cv-1', 'cat-1', 'team-any', 'business', 'b-1'),
                    ('cv-1', 'cat-2', 'team-other', NULL, NULL);",
        )
        .execute(&pool)
        .await
        .expect("seed");
        SqlCompetencyQuery::new(pool)
    }

    async fn eligible(
        query: &SqlCompetencyQuery,
        window: TimeWindow,
        zone: Option<&str>,
    ) -> Vec<String> {
        let cv = ContractVersionId("cv-1".to_string());
        query
            .eligible_teams(EligibilityQuery {
                contract_version_id: &cv,
                category_id: "cat-1",
                window,
                zone,
            })
            .await
            .expect("eligible teams")
    }

    #[tokio::test]
    async fn null_columns_act_as_wildcards() {
        let query = setup().await;

        assert_eq!(
            eligible(&query, TimeWindow::Business, Some("b-1")).await,
            vec!["team-any", "team-b1", "team-day"]
        );
        assert_eq!(eligible(&query, TimeWindow::AfterHours, Some("b-2")).await, vec!["team-any"]);
    }

    #[tokio::test]
    async fn missing_zone_only_matches_zone_agnostic_rows() {
        let query = setup().await;

        assert_eq!(
            eligible(&query, TimeWindow::Business, None).await,
            vec!["team-any", "team-day"]
        );
    }
}
