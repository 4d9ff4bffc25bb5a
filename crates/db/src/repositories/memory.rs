//! In-memory port adapters for tests and database-less wiring.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use ticketroute_core::domain::contract::{ContractVersion, ContractVersionId};
use ticketroute_core::domain::rule::{RoutingRule, RuleId, TimeWindow};
use ticketroute_core::routing::ports::{
    CompetencyQuery, ContractCategoryQuery, ContractQuery, EligibilityQuery, GeoQuery, LoadQuery,
    PortError, RoutingRuleRepository,
};

#[derive(Clone, Debug)]
struct CompetencyEntry {
    contract_version_id: String,
    category_id: String,
    team_id: String,
    window: Option<TimeWindow>,
    zone: Option<String>,
}

/// Contract versions, category coverage and the competency matrix.
#[derive(Default)]
pub struct InMemoryContractStore {
    versions: RwLock<HashMap<String, ContractVersion>>,
    categories: RwLock<HashMap<(String, String), bool>>,
    competencies: RwLock<Vec<CompetencyEntry>>,
}

impl InMemoryContractStore {
    pub async fn insert_version(&self, version: ContractVersion) {
        self.versions.write().await.insert(version.id.0.clone(), version);
    }

    pub async fn set_category(
        &self,
        contract_version_id: &ContractVersionId,
        category_id: &str,
        included: bool,
    ) {
        self.categories
            .write()
            .await
            .insert((contract_version_id.0.clone(), category_id.to_string()), included);
    }

    /// `None` window or zone matches any value.
    pub async fn add_competency(
        &self,
        contract_version_id: &ContractVersionId,
        category_id: &str,
        team_id: &str,
        window: Option<TimeWindow>,
        zone: Option<&str>,
    ) {
        self.competencies.write().await.push(CompetencyEntry {
            contract_version_id: contract_version_id.0.clone(),
            category_id: category_id.to_string(),
            team_id: team_id.to_string(),
            window,
            zone: zone.map(str::to_owned),
        });
    }
}

#[async_trait]
impl ContractQuery for InMemoryContractStore {
    async fn get_contract_version(
        &self,
        id: &ContractVersionId,
    ) -> Result<Option<ContractVersion>, PortError> {
        Ok(self.versions.read().await.get(&id.0).cloned())
    }
}

#[async_trait]
impl ContractCategoryQuery for InMemoryContractStore {
    async fn is_category_included(
        &self,
        contract_version_id: &ContractVersionId,
        category_id: &str,
    ) -> Result<bool, PortError> {
        let categories = self.categories.read().await;
        Ok(categories
            .get(&(contract_version_id.0.clone(), category_id.to_string()))
            .copied()
            .unwrap_or(false))
    }
}

#[async_trait]
impl CompetencyQuery for InMemoryContractStore {
    async fn eligible_teams(&self, query: EligibilityQuery<'_>) -> Result<Vec<String>, PortError> {
        let competencies = self.competencies.read().await;
        let mut teams: Vec<String> = competencies
            .iter()
            .filter(|entry| {
                entry.contract_version_id == query.contract_version_id.0
                    && entry.category_id == query.category_id
                    && entry.window.map_or(true, |window| window == query.window)
                    && entry.zone.as_deref().map_or(true, |zone| Some(zone) == query.zone)
            })
            .map(|entry| entry.team_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        teams.sort();
        Ok(teams)
    }
}

#[derive(Default)]
pub struct InMemoryRoutingRuleRepository {
    rules: RwLock<HashMap<String, RoutingRule>>,
}

#[async_trait]
impl RoutingRuleRepository for InMemoryRoutingRuleRepository {
    async fn list_by_contract_version(
        &self,
        contract_version_id: &ContractVersionId,
    ) -> Result<Vec<RoutingRule>, PortError> {
        let rules = self.rules.read().await;
        let mut listed: Vec<RoutingRule> = rules
            .values()
            .filter(|rule| &rule.contract_version_id == contract_version_id)
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            left.priority.cmp(&right.priority).then_with(|| left.id.cmp(&right.id))
        });
        Ok(listed)
    }

    async fn find_by_id(&self, id: &RuleId) -> Result<Option<RoutingRule>, PortError> {
        Ok(self.rules.read().await.get(&id.0).cloned())
    }

    async fn create(&self, rule: RoutingRule) -> Result<(), PortError> {
        self.rules.write().await.insert(rule.id.0.clone(), rule);
        Ok(())
    }

    async fn update(&self, rule: RoutingRule) -> Result<(), PortError> {
        self.rules.write().await.insert(rule.id.0.clone(), rule);
        Ok(())
    }

    async fn delete_by_id(&self, id: &RuleId) -> Result<bool, PortError> {
        Ok(self.rules.write().await.remove(&id.0).is_some())
    }
}

/// Open loads per team. Unknown teams are idle; teams marked failing error.
#[derive(Default)]
pub struct InMemoryLoadQuery {
    loads: RwLock<HashMap<String, f64>>,
    failing: RwLock<HashSet<String>>,
}

impl InMemoryLoadQuery {
    pub async fn set_load(&self, team_id: &str, open_tickets: f64) {
        self.loads.write().await.insert(team_id.to_string(), open_tickets);
    }

    pub async fn fail_for(&self, team_id: &str) {
        self.failing.write().await.insert(team_id.to_string());
    }
}

#[async_trait]
impl LoadQuery for InMemoryLoadQuery {
    async fn current_open_load(&self, team_id: &str) -> Result<f64, PortError> {
        if self.failing.read().await.contains(team_id) {
            return Err(PortError::Backend(format!("load unavailable for team `{team_id}`")));
        }
        Ok(self.loads.read().await.get(team_id).copied().unwrap_or(0.0))
    }
}

/// Distances keyed by team and location. Unknown pairs and teams marked
/// failing error.
#[derive(Default)]
pub struct InMemoryGeoQuery {
    distances: RwLock<HashMap<(String, String), f64>>,
    failing: RwLock<HashSet<String>>,
}

impl InMemoryGeoQuery {
    pub async fn set_distance(&self, team_id: &str, location_id: &str, distance: f64) {
        self.distances
            .write()
            .await
            .insert((team_id.to_string(), location_id.to_string()), distance);
    }

    pub async fn fail_for(&self, team_id: &str) {
        self.failing.write().await.insert(team_id.to_string());
    }
}

#[async_trait]
impl GeoQuery for InMemoryGeoQuery {
    async fn distance(&self, team_id: &str, location_id: Option<&str>) -> Result<f64, PortError> {
        if self.failing.read().await.contains(team_id) {
            return Err(PortError::Backend(format!("geo unavailable for team `{team_id}`")));
        }
        let location_id = location_id.unwrap_or_default();
        self.distances
            .read()
            .await
            .get(&(team_id.to_string(), location_id.to_string()))
            .copied()
            .ok_or_else(|| {
                PortError::Backend(format!(
                    "no distance known for team `{team_id}` at `{location_id}`"
                ))
            })
    }
}
