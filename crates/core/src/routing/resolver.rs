use crate::domain::rule::{AssignTarget, RoutingAction};

/// Flattens `assign` followed by `fallback`, in declaration order. No
/// deduplication and no eligibility filtering happen here.
pub fn resolve_candidates(action: &RoutingAction) -> Vec<AssignTarget> {
    action.assign.iter().chain(action.fallback.iter().flatten()).cloned().collect()
}
