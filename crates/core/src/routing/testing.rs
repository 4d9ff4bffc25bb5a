use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::context::EvaluationContext;
use crate::domain::contract::{ContractVersion, ContractVersionId};
use crate::domain::rule::{RoutingRule, RuleId, TimeWindow};
use crate::routing::ports::{
    CompetencyQuery, ContractCategoryQuery, ContractQuery, EligibilityQuery, GeoQuery, LoadQuery,
    PortError, RoutingRuleRepository,
};
use crate::routing::strategies::{InMemoryRoundRobinCursor, StrategyRegistry};
use crate::routing::RoutingPorts;

pub(crate) fn context() -> EvaluationContext {
    EvaluationContext {
        company_id: "co-1".to_string(),
        site_id: "site-1".to_string(),
        contract_version_id: ContractVersionId("cv-1".to_string()),
        category_id: "cat-1".to_string(),
        building_id: Some("b-1".to_string()),
        location_id: Some("l-1".to_string()),
        asset_kind: None,
        time_window: TimeWindow::Business,
        tags: None,
        priority: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeLoad {
    loads: HashMap<String, f64>,
    failing: HashSet<String>,
}

impl FakeLoad {
    pub(crate) fn with(mut self, team_id: &str, load: f64) -> Self {
        self.loads.insert(team_id.to_string(), load);
        self
    }

    pub(crate) fn failing(mut self, team_id: &str) -> Self {
        self.failing.insert(team_id.to_string());
        self
    }
}

#[async_trait]
impl LoadQuery for FakeLoad {
    async fn current_open_load(&self, team_id: &str) -> Result<f64, PortError> {
        if self.failing.contains(team_id) {
            return Err(PortError::Backend(format!("load query failed for {team_id}")));
        }
        Ok(self.loads.get(team_id).copied().unwrap_or(0.0))
    }
}

#[derive(Default)]
pub(crate) struct FakeGeo {
    distances: HashMap<String, f64>,
    failing: HashSet<String>,
}

impl FakeGeo {
    pub(crate) fn with(mut self, team_id: &str, distance: f64) -> Self {
        self.distances.insert(team_id.to_string(), distance);
        self
    }

    pub(crate) fn failing(mut self, team_id: &str) -> Self {
        self.failing.insert(team_id.to_string());
        self
    }
}

#[async_trait]
impl GeoQuery for FakeGeo {
    async fn distance(&self, team_id: &str, _location_id: Option<&str>) -> Result<f64, PortError> {
        if self.failing.contains(team_id) {
            return Err(PortError::Backend(format!("geo query failed for {team_id}")));
        }
        self.distances
            .get(team_id)
            .copied()
            .ok_or_else(|| PortError::Backend(format!("no distance known for {team_id}")))
    }
}

/// One in-memory stand-in for every contract-side collaborator.
#[derive(Default)]
pub(crate) struct FakeContracts {
    versions: HashMap<String, ContractVersion>,
    excluded_categories: HashSet<(String, String)>,
    eligible_teams: Vec<String>,
    rules: RwLock<Vec<RoutingRule>>,
}

impl FakeContracts {
    pub(crate) fn with_version(mut self, id: &str, company_id: &str) -> Self {
        self.versions.insert(
            id.to_string(),
            ContractVersion {
                id: ContractVersionId(id.to_string()),
                company_id: company_id.to_string(),
                site_id: None,
                label: None,
            },
        );
        self
    }

    pub(crate) fn excluding(mut self, contract_version_id: &str, category_id: &str) -> Self {
        self.excluded_categories
            .insert((contract_version_id.to_string(), category_id.to_string()));
        self
    }

    pub(crate) fn with_eligible(mut self, team_ids: &[&str]) -> Self {
        self.eligible_teams = team_ids.iter().map(|id| (*id).to_string()).collect();
        self
    }

    pub(crate) fn with_rules(self, rules: Vec<RoutingRule>) -> Self {
        Self { rules: RwLock::new(rules), ..self }
    }
}

#[async_trait]
impl ContractQuery for FakeContracts {
    async fn get_contract_version(
        &self,
        id: &ContractVersionId,
    ) -> Result<Option<ContractVersion>, PortError> {
        Ok(self.versions.get(&id.0).cloned())
    }
}

#[async_trait]
impl ContractCategoryQuery for FakeContracts {
    async fn is_category_included(
        &self,
        contract_version_id: &ContractVersionId,
        category_id: &str,
    ) -> Result<bool, PortError> {
        Ok(!self
            .excluded_categories
            .contains(&(contract_version_id.0.clone(), category_id.to_string())))
    }
}

#[async_trait]
impl CompetencyQuery for FakeContracts {
    async fn eligible_teams(&self, _query: EligibilityQuery<'_>) -> Result<Vec<String>, PortError> {
        Ok(self.eligible_teams.clone())
    }
}

#[async_trait]
impl RoutingRuleRepository for FakeContracts {
    async fn list_by_contract_version(
        &self,
        contract_version_id: &ContractVersionId,
    ) -> Result<Vec<RoutingRule>, PortError> {
        let rules = self.rules.read().await;
        Ok(rules
            .iter()
            .filter(|rule| &rule.contract_version_id == contract_version_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &RuleId) -> Result<Option<RoutingRule>, PortError> {
        let rules = self.rules.read().await;
        Ok(rules.iter().find(|rule| &rule.id == id).cloned())
    }

    async fn create(&self, rule: RoutingRule) -> Result<(), PortError> {
        self.rules.write().await.push(rule);
        Ok(())
    }

    async fn update(&self, rule: RoutingRule) -> Result<(), PortError> {
        let mut rules = self.rules.write().await;
        if let Some(existing) = rules.iter_mut().find(|existing| existing.id == rule.id) {
            *existing = rule;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &RuleId) -> Result<bool, PortError> {
        let mut rules = self.rules.write().await;
        let before = rules.len();
        rules.retain(|rule| &rule.id != id);
        Ok(rules.len() != before)
    }
}

pub(crate) fn ports(contracts: FakeContracts) -> RoutingPorts {
    let contracts = Arc::new(contracts);
    RoutingPorts {
        contracts: contracts.clone(),
        categories: contracts.clone(),
        competency: contracts.clone(),
        rules: contracts,
    }
}

pub(crate) fn registry(load: FakeLoad, geo: FakeGeo) -> StrategyRegistry {
    StrategyRegistry::standard(
        Arc::new(load),
        Arc::new(geo),
        Arc::new(InMemoryRoundRobinCursor::default()),
    )
}

pub(crate) fn rule(
    id: &str,
    priority: i32,
    condition: crate::domain::rule::RoutingCondition,
    action: crate::domain::rule::RoutingAction,
) -> RoutingRule {
    let now = chrono::Utc::now();
    RoutingRule {
        id: RuleId(id.to_string()),
        contract_version_id: ContractVersionId("cv-1".to_string()),
        priority,
        condition,
        action,
        created_at: now,
        updated_at: now,
    }
}
