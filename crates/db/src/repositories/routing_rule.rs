use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use ticketroute_core::domain::contract::ContractVersionId;
use ticketroute_core::domain::rule::{RoutingAction, RoutingCondition, RoutingRule, RuleId};
use ticketroute_core::routing::ports::{PortError, RoutingRuleRepository};

use super::{decode_err, RepositoryError};
use crate::DbPool;

const RULE_COLUMNS: &str =
    "id, contract_version_id, priority, condition_json, action_json, created_at, updated_at";

pub struct SqlRoutingRuleRepository {
    pool: DbPool,
}

impl SqlRoutingRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_for_contract(
        &self,
        contract_version_id: &ContractVersionId,
    ) -> Result<Vec<RoutingRule>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {RULE_COLUMNS} FROM routing_rule
             WHERE contract_version_id = ?
             ORDER BY priority ASC, id ASC"
        ))
        .bind(&contract_version_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rule).collect()
    }

    async fn fetch_one(&self, id: &RuleId) -> Result<Option<RoutingRule>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {RULE_COLUMNS} FROM routing_rule WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_rule).transpose()
    }

    async fn insert(&self, rule: &RoutingRule) -> Result<(), RepositoryError> {
        let (condition_json, action_json) = encode_parts(rule)?;
        sqlx::query(
            "INSERT INTO routing_rule (id, contract_version_id, priority, condition_json,
                                       action_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&rule.id.0)
        .bind(&rule.contract_version_id.0)
        .bind(rule.priority)
        .bind(condition_json)
        .bind(action_json)
        .bind(rule.created_at.to_rfc3339())
        .bind(rule.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace(&self, rule: &RoutingRule) -> Result<(), RepositoryError> {
        let (condition_json, action_json) = encode_parts(rule)?;
        sqlx::query(
            "UPDATE routing_rule
             SET priority = ?, condition_json = ?, action_json = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(rule.priority)
        .bind(condition_json)
        .bind(action_json)
        .bind(rule.updated_at.to_rfc3339())
        .bind(&rule.id.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, id: &RuleId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM routing_rule WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoutingRuleRepository for SqlRoutingRuleRepository {
    async fn list_by_contract_version(
        &self,
        contract_version_id: &ContractVersionId,
    ) -> Result<Vec<RoutingRule>, PortError> {
        Ok(self.fetch_for_contract(contract_version_id).await?)
    }

    async fn find_by_id(&self, id: &RuleId) -> Result<Option<RoutingRule>, PortError> {
        Ok(self.fetch_one(id).await?)
    }

    async fn create(&self, rule: RoutingRule) -> Result<(), PortError> {
        Ok(self.insert(&rule).await?)
    }

    async fn update(&self, rule: RoutingRule) -> Result<(), PortError> {
        Ok(self.replace(&rule).await?)
    }

    async fn delete_by_id(&self, id: &RuleId) -> Result<bool, PortError> {
        Ok(self.remove(id).await?)
    }
}

fn encode_parts(rule: &RoutingRule) -> Result<(String, String), RepositoryError> {
    let condition_json = serde_json::to_string(&rule.condition).map_err(decode_err)?;
    let action_json = serde_json::to_string(&rule.action).map_err(decode_err)?;
    Ok((condition_json, action_json))
}

pub(crate) fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> Result<RoutingRule, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let contract_version_id: String = row.try_get("contract_version_id").map_err(decode_err)?;
    let priority: i64 = row.try_get("priority").map_err(decode_err)?;
    let condition_json: String = row.try_get("condition_json").map_err(decode_err)?;
    let action_json: String = row.try_get("action_json").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;

    let condition: RoutingCondition = serde_json::from_str(&condition_json)
        .map_err(|error| RepositoryError::Decode(format!("rule `{id}` condition: {error}")))?;
    let action: RoutingAction = serde_json::from_str(&action_json)
        .map_err(|error| RepositoryError::Decode(format!("rule `{id}` action: {error}")))?;
    let priority = i32::try_from(priority)
        .map_err(|_| RepositoryError::Decode(format!("rule `{id}` priority out of range")))?;

    Ok(RoutingRule {
        id: RuleId(id),
        contract_version_id: ContractVersionId(contract_version_id),
        priority,
        condition,
        action,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).map_err(decode_err)
}
