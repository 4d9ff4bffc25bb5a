use std::fs;
use std::path::PathBuf;

use clap::Args;
use ticketroute_core::errors::InterfaceError;
use ticketroute_core::{Actor, EvaluationContext, EvaluationOutcome, RoutingService};
use ticketroute_db::{sql_routing_ports, sql_strategy_registry};

use crate::commands::{
    connect, load_config, runtime, CommandResult, Failure, EXIT_INPUT, EXIT_ROUTING,
};

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// JSON file holding the evaluation context (camelCase keys).
    #[arg(long, value_name = "FILE")]
    pub context: PathBuf,
    /// Id of the acting user.
    #[arg(long, value_name = "ID")]
    pub actor: String,
    /// Company the actor belongs to.
    #[arg(long, value_name = "ID")]
    pub company: Option<String>,
    /// Scope string held by the actor. Repeatable.
    #[arg(long = "scope", value_name = "SCOPE")]
    pub scopes: Vec<String>,
    /// Extra company the actor is granted. Repeatable.
    #[arg(long = "company-scope", value_name = "ID")]
    pub company_scopes: Vec<String>,
}

impl SimulateArgs {
    fn actor(&self) -> Actor {
        Actor {
            id: self.actor.clone(),
            company_id: self.company.clone(),
            scope_strings: self.scopes.clone(),
            company_scope_ids: self.company_scopes.clone(),
        }
    }
}

pub fn run(args: &SimulateArgs) -> CommandResult {
    let ctx = match read_context(args) {
        Ok(ctx) => ctx,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("simulate", error_class, message, exit_code);
        }
    };
    let config = match load_config("simulate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("simulate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;
        let service = RoutingService::with_super_admin_scope(
            sql_routing_ports(&pool),
            sql_strategy_registry(&pool, config.routing.cursor_store),
            &config.routing.super_admin_scope,
        );

        let outcome = service.simulate(&args.actor(), &ctx).await.map_err(|error| {
            let interface = error.into_interface("cli");
            (error_class(&interface), interface.message().to_owned(), EXIT_ROUTING)
        });
        pool.close().await;
        outcome
    });

    match result {
        Ok(evaluation) => {
            let message = match &evaluation.outcome {
                EvaluationOutcome::Assigned { assignee_id, rule_id, .. } => {
                    format!("assigned to {assignee_id} by rule {rule_id}")
                }
                EvaluationOutcome::NoAssignment { reason } => {
                    format!("no assignment ({})", reason_label(*reason))
                }
            };
            match serde_json::to_value(&evaluation) {
                Ok(payload) => CommandResult::success_with_result("simulate", message, payload),
                Err(error) => CommandResult::failure(
                    "simulate",
                    "serialization",
                    error.to_string(),
                    EXIT_ROUTING,
                ),
            }
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("simulate", error_class, message, exit_code)
        }
    }
}

fn read_context(args: &SimulateArgs) -> Result<EvaluationContext, Failure> {
    let raw = fs::read_to_string(&args.context).map_err(|error| {
        ("context_read", format!("{}: {error}", args.context.display()), EXIT_INPUT)
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        ("context_parse", format!("{}: {error}", args.context.display()), EXIT_INPUT)
    })
}

fn error_class(error: &InterfaceError) -> &'static str {
    match error {
        InterfaceError::BadRequest { .. } => "bad_request",
        InterfaceError::Forbidden { .. } => "forbidden",
        InterfaceError::NotFound { .. } => "not_found",
        InterfaceError::Conflict { .. } => "conflict",
        InterfaceError::ServiceUnavailable { .. } => "service_unavailable",
        InterfaceError::Internal { .. } => "internal",
    }
}

fn reason_label(reason: ticketroute_core::NoAssignmentReason) -> &'static str {
    use ticketroute_core::NoAssignmentReason::*;

    match reason {
        ScopeViolation => "scope_violation",
        NoMatch => "no_match",
        NoEligibleCandidate => "no_eligible_candidate",
    }
}
