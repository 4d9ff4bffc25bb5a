pub mod config;
pub mod domain;
pub mod errors;
pub mod routing;

pub use domain::actor::Actor;
pub use domain::context::EvaluationContext;
pub use domain::contract::{ContractVersion, ContractVersionId};
pub use domain::evaluation::{
    AssigneeType, Candidate, EvaluationOutcome, EvaluationResult, NoAssignmentReason, TraceEntry,
};
pub use domain::rule::{
    AssignTarget, OrderStrategy, RoutingAction, RoutingCondition, RoutingRule, RuleId, TimeWindow,
};
pub use errors::{ApplicationError, DomainError, InterfaceError, InvalidRuleError};
pub use routing::rules::{CreateRuleInput, RulePatch};
pub use routing::service::RoutingService;
pub use routing::strategies::{InMemoryRoundRobinCursor, StrategyRegistry};
pub use routing::RoutingPorts;
