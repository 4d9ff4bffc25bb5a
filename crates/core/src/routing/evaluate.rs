use std::collections::HashSet;

use tracing::{debug, info};

use crate::domain::actor::{Actor, DEFAULT_SUPER_ADMIN_SCOPE};
use crate::domain::context::EvaluationContext;
use crate::domain::evaluation::{Candidate, EvaluationResult, NoAssignmentReason};
use crate::domain::rule::AssignTarget;
use crate::errors::ApplicationError;
use crate::routing::matcher::matches;
use crate::routing::ports::EligibilityQuery;
use crate::routing::resolver::resolve_candidates;
use crate::routing::tiebreaker::TiebreakerEngine;
use crate::routing::{authorize_contract_version, RoutingPorts};

/// Produces the routing decision for one ticket.
///
/// Unknown contract versions and company-scope denials are errors. Excluded
/// categories and exhausted rule sets are ordinary `NO_ASSIGNMENT` results.
#[derive(Clone)]
pub struct EvaluateRouting {
    ports: RoutingPorts,
    tiebreaker: TiebreakerEngine,
    super_admin_scope: String,
}

impl EvaluateRouting {
    pub fn new(ports: RoutingPorts, tiebreaker: TiebreakerEngine) -> Self {
        Self { ports, tiebreaker, super_admin_scope: DEFAULT_SUPER_ADMIN_SCOPE.to_string() }
    }

    pub fn with_super_admin_scope(mut self, scope: impl Into<String>) -> Self {
        self.super_admin_scope = scope.into();
        self
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        ctx: &EvaluationContext,
    ) -> Result<EvaluationResult, ApplicationError> {
        authorize_contract_version(
            self.ports.contracts.as_ref(),
            actor,
            &ctx.contract_version_id,
            &self.super_admin_scope,
        )
        .await?;

        let included = self
            .ports
            .categories
            .is_category_included(&ctx.contract_version_id, &ctx.category_id)
            .await?;
        if !included {
            info!(
                event_name = "routing.evaluate.scope_violation",
                contract_version_id = %ctx.contract_version_id,
                category_id = %ctx.category_id,
                "category is not covered by contract version"
            );
            return Ok(EvaluationResult::no_assignment(NoAssignmentReason::ScopeViolation));
        }

        let eligible: HashSet<String> = self
            .ports
            .competency
            .eligible_teams(EligibilityQuery {
                contract_version_id: &ctx.contract_version_id,
                category_id: &ctx.category_id,
                window: ctx.time_window,
                zone: ctx.building_id.as_deref(),
            })
            .await?
            .into_iter()
            .collect();

        let mut rules = self.ports.rules.list_by_contract_version(&ctx.contract_version_id).await?;
        rules.sort_by(|left, right| {
            left.priority.cmp(&right.priority).then_with(|| left.id.cmp(&right.id))
        });

        for rule in &rules {
            if !matches(ctx, &rule.condition) {
                continue;
            }

            let mut candidates: Vec<Candidate> = resolve_candidates(&rule.action)
                .into_iter()
                .filter(|target| match target {
                    AssignTarget::Team { team_id } => eligible.contains(team_id),
                    AssignTarget::Vendor { .. } => true,
                })
                .map(Candidate::from)
                .collect();

            if candidates.is_empty() {
                debug!(
                    event_name = "routing.evaluate.rule_without_candidates",
                    contract_version_id = %ctx.contract_version_id,
                    rule_id = %rule.id,
                    "matched rule has no eligible candidate, trying next rule"
                );
                continue;
            }

            let (winner, trace) = if candidates.len() == 1 {
                (candidates.remove(0), Vec::new())
            } else {
                let outcome = self.tiebreaker.pick(ctx, candidates, rule.action.order).await?;
                (outcome.winner, outcome.trace)
            };

            info!(
                event_name = "routing.evaluate.assigned",
                contract_version_id = %ctx.contract_version_id,
                category_id = %ctx.category_id,
                rule_id = %rule.id,
                assignee_id = %winner.id,
                "ticket routing resolved"
            );
            return Ok(EvaluationResult::assigned(winner, rule.id.clone(), trace));
        }

        info!(
            event_name = "routing.evaluate.no_match",
            contract_version_id = %ctx.contract_version_id,
            category_id = %ctx.category_id,
            rules_considered = rules.len(),
            "no routing rule produced a candidate"
        );
        Ok(EvaluationResult::no_assignment(NoAssignmentReason::NoMatch))
    }
}
