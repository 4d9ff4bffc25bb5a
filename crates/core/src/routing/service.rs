use crate::domain::actor::{Actor, DEFAULT_SUPER_ADMIN_SCOPE};
use crate::domain::context::EvaluationContext;
use crate::domain::contract::ContractVersionId;
use crate::domain::evaluation::EvaluationResult;
use crate::domain::rule::{RoutingRule, RuleId};
use crate::errors::ApplicationError;
use crate::routing::evaluate::EvaluateRouting;
use crate::routing::rules::{
    CreateRoutingRule, CreateRuleInput, DeleteRoutingRule, ListRoutingRules, RulePatch,
    UpdateRoutingRule,
};
use crate::routing::strategies::StrategyRegistry;
use crate::routing::tiebreaker::TiebreakerEngine;
use crate::routing::RoutingPorts;

/// Entry point for the ticket-assignment workflow and rule administration.
#[derive(Clone)]
pub struct RoutingService {
    evaluate: EvaluateRouting,
    create: CreateRoutingRule,
    update: UpdateRoutingRule,
    delete: DeleteRoutingRule,
    list: ListRoutingRules,
}

impl RoutingService {
    pub fn new(ports: RoutingPorts, registry: StrategyRegistry) -> Self {
        Self::with_super_admin_scope(ports, registry, DEFAULT_SUPER_ADMIN_SCOPE)
    }

    pub fn with_super_admin_scope(
        ports: RoutingPorts,
        registry: StrategyRegistry,
        super_admin_scope: &str,
    ) -> Self {
        Self {
            evaluate: EvaluateRouting::new(ports.clone(), TiebreakerEngine::new(registry))
                .with_super_admin_scope(super_admin_scope),
            create: CreateRoutingRule::new(ports.clone(), super_admin_scope),
            update: UpdateRoutingRule::new(ports.clone(), super_admin_scope),
            delete: DeleteRoutingRule::new(ports.clone(), super_admin_scope),
            list: ListRoutingRules::new(ports, super_admin_scope),
        }
    }

    pub async fn create_rule(
        &self,
        actor: &Actor,
        input: CreateRuleInput,
    ) -> Result<RoutingRule, ApplicationError> {
        self.create.execute(actor, input).await
    }

    pub async fn update_rule(
        &self,
        actor: &Actor,
        rule_id: &RuleId,
        patch: RulePatch,
    ) -> Result<RoutingRule, ApplicationError> {
        self.update.execute(actor, rule_id, patch).await
    }

    pub async fn delete_rule(&self, actor: &Actor, rule_id: &RuleId) -> Result<(), ApplicationError> {
        self.delete.execute(actor, rule_id).await
    }

    pub async fn list_rules(
        &self,
        actor: &Actor,
        contract_version_id: &ContractVersionId,
    ) -> Result<Vec<RoutingRule>, ApplicationError> {
        self.list.execute(actor, contract_version_id).await
    }

    pub async fn evaluate(
        &self,
        actor: &Actor,
        ctx: &EvaluationContext,
    ) -> Result<EvaluationResult, ApplicationError> {
        self.evaluate.execute(actor, ctx).await
    }

    /// Same decision as `evaluate`. Kept separate so dry-run callers are
    /// distinguishable in logs.
    pub async fn simulate(
        &self,
        actor: &Actor,
        ctx: &EvaluationContext,
    ) -> Result<EvaluationResult, ApplicationError> {
        tracing::debug!(
            event_name = "routing.simulate",
            actor_id = %actor.id,
            contract_version_id = %ctx.contract_version_id,
            "simulating routing decision"
        );
        self.evaluate.execute(actor, ctx).await
    }
}
