use serde::{Deserialize, Serialize};

use crate::domain::rule::{AssignTarget, OrderStrategy, RuleId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeType {
    Team,
    Vendor,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "type")]
    pub kind: AssigneeType,
    pub id: String,
}

impl Candidate {
    pub fn team(id: impl Into<String>) -> Self {
        Self { kind: AssigneeType::Team, id: id.into() }
    }

    pub fn vendor(id: impl Into<String>) -> Self {
        Self { kind: AssigneeType::Vendor, id: id.into() }
    }
}

impl From<AssignTarget> for Candidate {
    fn from(target: AssignTarget) -> Self {
        match target {
            AssignTarget::Team { team_id } => Self::team(team_id),
            AssignTarget::Vendor { external_vendor_id } => Self::vendor(external_vendor_id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoAssignmentReason {
    ScopeViolation,
    NoMatch,
    NoEligibleCandidate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationOutcome {
    Assigned {
        #[serde(rename = "assigneeType")]
        assignee_type: AssigneeType,
        #[serde(rename = "assigneeId")]
        assignee_id: String,
        #[serde(rename = "ruleId")]
        rule_id: RuleId,
    },
    NoAssignment {
        reason: NoAssignmentReason,
    },
}

/// Marker strategies recorded in a tiebreak trace: the four ordering
/// strategies plus the `default_chain` marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStrategy {
    DefaultChain,
    AsListed,
    LeastLoad,
    Nearest,
    RoundRobin,
}

impl From<OrderStrategy> for TraceStrategy {
    fn from(strategy: OrderStrategy) -> Self {
        match strategy {
            OrderStrategy::AsListed => Self::AsListed,
            OrderStrategy::LeastLoad => Self::LeastLoad,
            OrderStrategy::Nearest => Self::Nearest,
            OrderStrategy::RoundRobin => Self::RoundRobin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub candidate_id: String,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub strategy: TraceStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<CandidateScore>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<String>,
}

impl TraceEntry {
    pub fn default_chain_marker() -> Self {
        Self { strategy: TraceStrategy::DefaultChain, scores: None, winner_id: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub outcome: EvaluationOutcome,
    pub tiebreaker_trace: Vec<TraceEntry>,
}

impl EvaluationResult {
    pub fn assigned(candidate: Candidate, rule_id: RuleId, trace: Vec<TraceEntry>) -> Self {
        Self {
            outcome: EvaluationOutcome::Assigned {
                assignee_type: candidate.kind,
                assignee_id: candidate.id,
                rule_id,
            },
            tiebreaker_trace: trace,
        }
    }

    pub fn no_assignment(reason: NoAssignmentReason) -> Self {
        Self { outcome: EvaluationOutcome::NoAssignment { reason }, tiebreaker_trace: Vec::new() }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self.outcome, EvaluationOutcome::Assigned { .. })
    }
}
