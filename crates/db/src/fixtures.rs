use sqlx::Executor;

use ticketroute_core::domain::contract::ContractVersionId;
use ticketroute_core::routing::ports::RoutingRuleRepository;

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlRoutingRuleRepository};

pub const DEMO_COMPANY_ID: &str = "company-demo-001";
pub const DEMO_CONTRACT_VERSION_ID: &str = "cv-demo-001";
pub const DEMO_SITE_ID: &str = "site-demo-001";
pub const DEMO_BUILDING_ID: &str = "bldg-demo-001";
pub const DEMO_LOCATION_ID: &str = "loc-demo-001";

pub const TEAM_NORTH: &str = "6f1c2d3e-0a1b-4c5d-8e9f-101112131415";
pub const TEAM_SOUTH: &str = "7a2b3c4d-1e2f-4a5b-9c6d-161718192021";
pub const TEAM_NIGHT: &str = "8b3c4d5e-2f3a-4b5c-8d7e-222324252627";
pub const DEMO_VENDOR: &str = "9c4d5e6f-3a4b-4c5d-9e8f-282930313233";

pub const DEMO_TEAMS: &[&str] = &[TEAM_NORTH, TEAM_SOUTH, TEAM_NIGHT];
pub const DEMO_RULE_IDS: &[&str] = &[
    "d1000000-0000-4000-8000-000000000001",
    "d1000000-0000-4000-8000-000000000002",
    "d1000000-0000-4000-8000-000000000003",
];

/// Deterministic demo data: one company with one contract version, three
/// teams and three routing rules.
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Loads the dataset. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            company_id: DEMO_COMPANY_ID,
            contract_version_id: DEMO_CONTRACT_VERSION_ID,
            teams: DEMO_TEAMS.len(),
            rules: DEMO_RULE_IDS.len(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let contract_ok: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM contract_version WHERE id = ?1 AND company_id = ?2)",
        )
        .bind(DEMO_CONTRACT_VERSION_ID)
        .bind(DEMO_COMPANY_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("contract-version", contract_ok == 1));

        let team_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT team_id) FROM team_competency WHERE contract_version_id = ?1",
        )
        .bind(DEMO_CONTRACT_VERSION_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("competency-teams", team_count == DEMO_TEAMS.len() as i64));

        let load_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM team_open_load WHERE team_id IN {}",
            sql_array_from_ids(DEMO_TEAMS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("team-loads", load_count == DEMO_TEAMS.len() as i64));

        let excluded: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM contract_category WHERE contract_version_id = ?1 AND included = 0",
        )
        .bind(DEMO_CONTRACT_VERSION_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("excluded-category", excluded == 1));

        let rules = SqlRoutingRuleRepository::new(pool.clone())
            .list_by_contract_version(&ContractVersionId(DEMO_CONTRACT_VERSION_ID.to_string()))
            .await
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let rule_ids: Vec<&str> = rules.iter().map(|rule| rule.id.0.as_str()).collect();
        checks.push(("routing-rules", rule_ids == DEMO_RULE_IDS));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub company_id: &'static str,
    pub contract_version_id: &'static str,
    pub teams: usize,
    pub rules: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_mentions_every_demo_identifier() {
        for id in DEMO_TEAMS.iter().chain(DEMO_RULE_IDS).chain([&DEMO_VENDOR]) {
            assert!(DemoDataset::SQL.contains(id), "fixture should mention `{id}`");
        }
    }

    #[tokio::test]
    async fn load_is_idempotent_and_verifies() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");

        let empty = DemoDataset::verify(&pool).await.expect("verify empty database");
        assert!(!empty.all_present);

        let first = DemoDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification = DemoDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.teams, 3);
        assert_eq!(first.rules, 3);

        DemoDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            DemoDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert_eq!(first_verification.checks, second_verification.checks);

        let rule_rows: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM routing_rule")
            .fetch_one(&pool)
            .await
            .expect("count rules");
        assert_eq!(rule_rows, 3);
    }
}
