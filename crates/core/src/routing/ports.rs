//! Narrow query/command interfaces the routing engine consumes. Adapters live
//! in `ticketroute-db`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::contract::{ContractVersion, ContractVersionId};
use crate::domain::rule::{RoutingRule, RuleId, TimeWindow};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("decode failure: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EligibilityQuery<'a> {
    pub contract_version_id: &'a ContractVersionId,
    pub category_id: &'a str,
    pub window: TimeWindow,
    pub zone: Option<&'a str>,
}

#[async_trait]
pub trait ContractQuery: Send + Sync {
    async fn get_contract_version(
        &self,
        id: &ContractVersionId,
    ) -> Result<Option<ContractVersion>, PortError>;
}

#[async_trait]
pub trait ContractCategoryQuery: Send + Sync {
    async fn is_category_included(
        &self,
        contract_version_id: &ContractVersionId,
        category_id: &str,
    ) -> Result<bool, PortError>;
}

#[async_trait]
pub trait CompetencyQuery: Send + Sync {
    async fn eligible_teams(&self, query: EligibilityQuery<'_>) -> Result<Vec<String>, PortError>;
}

/// Rule persistence. `list_by_contract_version` returns rules ordered by
/// priority ascending, then id ascending.
#[async_trait]
pub trait RoutingRuleRepository: Send + Sync {
    async fn list_by_contract_version(
        &self,
        contract_version_id: &ContractVersionId,
    ) -> Result<Vec<RoutingRule>, PortError>;

    async fn find_by_id(&self, id: &RuleId) -> Result<Option<RoutingRule>, PortError>;

    async fn create(&self, rule: RoutingRule) -> Result<(), PortError>;

    async fn update(&self, rule: RoutingRule) -> Result<(), PortError>;

    /// Returns `false` when no rule with `id` existed.
    async fn delete_by_id(&self, id: &RuleId) -> Result<bool, PortError>;
}

#[async_trait]
pub trait LoadQuery: Send + Sync {
    async fn current_open_load(&self, team_id: &str) -> Result<f64, PortError>;
}

#[async_trait]
pub trait GeoQuery: Send + Sync {
    async fn distance(&self, team_id: &str, location_id: Option<&str>) -> Result<f64, PortError>;
}

/// Fairness cursor for round-robin tiebreaks, keyed by
/// `contractVersionId:categoryId`.
#[async_trait]
pub trait RoundRobinCursor: Send + Sync {
    /// Returns the rotation offset for this pick (`cursor mod len`) and
    /// advances the stored cursor to `(cursor + 1) mod len`.
    async fn advance(&self, key: &str, len: usize) -> Result<usize, PortError>;
}
