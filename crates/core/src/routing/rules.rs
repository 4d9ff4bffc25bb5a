//! Rule lifecycle use cases. Each one validates its input first, then checks
//! the actor's company scope against the owning contract version.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::actor::Actor;
use crate::domain::contract::ContractVersionId;
use crate::domain::rule::{
    RoutingAction, RoutingCondition, RoutingRule, RuleId, DEFAULT_RULE_PRIORITY,
};
use crate::errors::ApplicationError;
use crate::routing::validator::{validate_action, validate_condition, validate_priority};
use crate::routing::{authorize_contract_version, RoutingPorts};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleInput {
    pub contract_version_id: ContractVersionId,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default = "empty_condition")]
    pub condition: Value,
    pub action: Value,
}

fn empty_condition() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Partial update. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatch {
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub condition: Option<Value>,
    #[serde(default)]
    pub action: Option<Value>,
}

#[derive(Clone)]
pub struct CreateRoutingRule {
    ports: RoutingPorts,
    super_admin_scope: String,
}

impl CreateRoutingRule {
    pub fn new(ports: RoutingPorts, super_admin_scope: impl Into<String>) -> Self {
        Self { ports, super_admin_scope: super_admin_scope.into() }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        input: CreateRuleInput,
    ) -> Result<RoutingRule, ApplicationError> {
        let condition = validate_condition(&input.condition)?;
        let action = validate_action(&input.action)?;
        let priority = match input.priority {
            Some(raw) => validate_priority(raw)?,
            None => DEFAULT_RULE_PRIORITY,
        };

        authorize_contract_version(
            self.ports.contracts.as_ref(),
            actor,
            &input.contract_version_id,
            &self.super_admin_scope,
        )
        .await?;

        let now = Utc::now();
        let rule = RoutingRule {
            id: RuleId::generate(),
            contract_version_id: input.contract_version_id,
            priority,
            condition,
            action,
            created_at: now,
            updated_at: now,
        };
        self.ports.rules.create(rule.clone()).await?;

        info!(
            event_name = "routing.rule.created",
            actor_id = %actor.id,
            contract_version_id = %rule.contract_version_id,
            rule_id = %rule.id,
            priority = rule.priority,
            "routing rule created"
        );
        Ok(rule)
    }
}

#[derive(Clone)]
pub struct UpdateRoutingRule {
    ports: RoutingPorts,
    super_admin_scope: String,
}

impl UpdateRoutingRule {
    pub fn new(ports: RoutingPorts, super_admin_scope: impl Into<String>) -> Self {
        Self { ports, super_admin_scope: super_admin_scope.into() }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        rule_id: &RuleId,
        patch: RulePatch,
    ) -> Result<RoutingRule, ApplicationError> {
        let condition: Option<RoutingCondition> =
            patch.condition.as_ref().map(validate_condition).transpose()?;
        let action: Option<RoutingAction> =
            patch.action.as_ref().map(validate_action).transpose()?;
        let priority = patch.priority.map(validate_priority).transpose()?;

        let mut rule = find_rule(&self.ports, rule_id).await?;
        authorize_contract_version(
            self.ports.contracts.as_ref(),
            actor,
            &rule.contract_version_id,
            &self.super_admin_scope,
        )
        .await?;

        if let Some(condition) = condition {
            rule.condition = condition;
        }
        if let Some(action) = action {
            rule.action = action;
        }
        if let Some(priority) = priority {
            rule.priority = priority;
        }
        rule.updated_at = Utc::now();
        self.ports.rules.update(rule.clone()).await?;

        info!(
            event_name = "routing.rule.updated",
            actor_id = %actor.id,
            contract_version_id = %rule.contract_version_id,
            rule_id = %rule.id,
            "routing rule updated"
        );
        Ok(rule)
    }
}

#[derive(Clone)]
pub struct DeleteRoutingRule {
    ports: RoutingPorts,
    super_admin_scope: String,
}

impl DeleteRoutingRule {
    pub fn new(ports: RoutingPorts, super_admin_scope: impl Into<String>) -> Self {
        Self { ports, super_admin_scope: super_admin_scope.into() }
    }

    pub async fn execute(&self, actor: &Actor, rule_id: &RuleId) -> Result<(), ApplicationError> {
        let rule = find_rule(&self.ports, rule_id).await?;
        authorize_contract_version(
            self.ports.contracts.as_ref(),
            actor,
            &rule.contract_version_id,
            &self.super_admin_scope,
        )
        .await?;

        if !self.ports.rules.delete_by_id(rule_id).await? {
            return Err(ApplicationError::NotFound { entity: "routing rule", id: rule_id.0.clone() });
        }

        info!(
            event_name = "routing.rule.deleted",
            actor_id = %actor.id,
            contract_version_id = %rule.contract_version_id,
            rule_id = %rule_id,
            "routing rule deleted"
        );
        Ok(())
    }
}

/// Lists a contract version's rules in evaluation order. Any failure while
/// resolving the contract version or the actor's scope yields an empty list.
#[derive(Clone)]
pub struct ListRoutingRules {
    ports: RoutingPorts,
    super_admin_scope: String,
}

impl ListRoutingRules {
    pub fn new(ports: RoutingPorts, super_admin_scope: impl Into<String>) -> Self {
        Self { ports, super_admin_scope: super_admin_scope.into() }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        contract_version_id: &ContractVersionId,
    ) -> Result<Vec<RoutingRule>, ApplicationError> {
        if let Err(error) = authorize_contract_version(
            self.ports.contracts.as_ref(),
            actor,
            contract_version_id,
            &self.super_admin_scope,
        )
        .await
        {
            debug!(
                event_name = "routing.rule.list_denied",
                actor_id = %actor.id,
                contract_version_id = %contract_version_id,
                error = %error,
                "rule listing resolved to empty"
            );
            return Ok(Vec::new());
        }

        let mut rules = self.ports.rules.list_by_contract_version(contract_version_id).await?;
        rules.sort_by(|left, right| {
            left.priority.cmp(&right.priority).then_with(|| left.id.cmp(&right.id))
        });
        Ok(rules)
    }
}

async fn find_rule(ports: &RoutingPorts, rule_id: &RuleId) -> Result<RoutingRule, ApplicationError> {
    ports
        .rules
        .find_by_id(rule_id)
        .await?
        .ok_or_else(|| ApplicationError::NotFound { entity: "routing rule", id: rule_id.0.clone() })
}
