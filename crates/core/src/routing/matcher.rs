use crate::domain::context::EvaluationContext;
use crate::domain::rule::{ConditionGuards, RoutingCondition};

/// Pure predicate: does `condition` hold for `ctx`?
pub fn matches(ctx: &EvaluationContext, condition: &RoutingCondition) -> bool {
    match condition {
        RoutingCondition::AnyOf { any_of } if !any_of.is_empty() => {
            any_of.iter().any(|child| matches(ctx, child))
        }
        RoutingCondition::AnyOf { .. } => true,
        RoutingCondition::Match(guards) => guards_hold(ctx, guards),
    }
}

fn guards_hold(ctx: &EvaluationContext, guards: &ConditionGuards) -> bool {
    if let Some(category_id) = &guards.category_id {
        if *category_id != ctx.category_id {
            return false;
        }
    }

    // An unprioritized ticket is not denied by a priority guard.
    if let (Some(priority_in), Some(priority)) = (&guards.priority_in, ctx.priority) {
        if !priority_in.contains(&priority) {
            return false;
        }
    }

    if let Some(building_id) = &guards.building_id {
        if ctx.building_id.as_ref() != Some(building_id) {
            return false;
        }
    }

    if let Some(location_id) = &guards.location_id {
        if ctx.location_id.as_ref() != Some(location_id) {
            return false;
        }
    }

    if let Some(asset_kind_in) = &guards.asset_kind_in {
        let Some(asset_kind) = &ctx.asset_kind else {
            return false;
        };
        if !asset_kind_in.contains(asset_kind) {
            return false;
        }
    }

    if let Some(time_window) = guards.time_window {
        if time_window != ctx.time_window {
            return false;
        }
    }

    if let Some(tags_any_of) = &guards.tags_any_of {
        let Some(tags) = &ctx.tags else {
            return false;
        };
        if !tags.iter().any(|tag| tags_any_of.contains(tag)) {
            return false;
        }
    }

    true
}
