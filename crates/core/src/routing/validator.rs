//! Structural validation of untrusted rule input. Every check runs before any
//! storage or collaborator call; success yields the typed rule parts.

use serde_json::{Map, Value};

use crate::domain::rule::{
    AssignTarget, ConditionGuards, OrderStrategy, RoutingAction, RoutingCondition, TimeWindow,
};
use crate::errors::InvalidRuleError;

const CONDITION_KEYS: &[&str] = &[
    "categoryId",
    "priorityIn",
    "buildingId",
    "locationId",
    "assetKindIn",
    "timeWindow",
    "tagsAnyOf",
    "anyOf",
];

const ACTION_KEYS: &[&str] = &["assign", "order", "fallback"];

pub fn validate_condition(value: &Value) -> Result<RoutingCondition, InvalidRuleError> {
    let object = value.as_object().ok_or_else(|| InvalidRuleError::new("condition"))?;
    reject_unknown_keys(object, CONDITION_KEYS, "condition")?;

    let guards = ConditionGuards {
        category_id: optional_string(object, "categoryId", "condition.categoryId")?,
        priority_in: optional_int_list(object, "priorityIn", "condition.priorityIn")?,
        building_id: optional_string(object, "buildingId", "condition.buildingId")?,
        location_id: optional_string(object, "locationId", "condition.locationId")?,
        asset_kind_in: optional_string_list(object, "assetKindIn", "condition.assetKindIn")?,
        time_window: optional_time_window(object)?,
        tags_any_of: optional_string_list(object, "tagsAnyOf", "condition.tagsAnyOf")?,
    };

    match present(object, "anyOf") {
        None => Ok(RoutingCondition::Match(guards)),
        Some(Value::Array(children)) if !children.is_empty() => {
            let any_of = children.iter().map(validate_condition).collect::<Result<Vec<_>, _>>()?;
            Ok(RoutingCondition::AnyOf { any_of })
        }
        Some(_) => Err(InvalidRuleError::new("condition.anyOf")),
    }
}

pub fn validate_action(value: &Value) -> Result<RoutingAction, InvalidRuleError> {
    let object = value.as_object().ok_or_else(|| InvalidRuleError::new("action"))?;
    reject_unknown_keys(object, ACTION_KEYS, "action")?;

    let assign = match present(object, "assign") {
        None => return Err(InvalidRuleError::new("action.assign")),
        Some(Value::Array(items)) => {
            if items.is_empty() {
                return Err(InvalidRuleError::new("action.assign"));
            }
            items
                .iter()
                .map(|item| validate_target(item, "action.assign.target"))
                .collect::<Result<Vec<_>, _>>()?
        }
        Some(single) => vec![validate_target(single, "action.assign.target")?],
    };

    let order = match present(object, "order") {
        None => None,
        Some(raw) => Some(
            raw.as_str()
                .and_then(OrderStrategy::parse)
                .ok_or_else(|| InvalidRuleError::new("action.order"))?,
        ),
    };

    let fallback = match present(object, "fallback") {
        None => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| validate_target(item, "action.fallback.target"))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => return Err(InvalidRuleError::new("action.fallback")),
    };

    Ok(RoutingAction { assign, order, fallback })
}

pub fn validate_priority(priority: i64) -> Result<i32, InvalidRuleError> {
    if priority < 0 {
        return Err(InvalidRuleError::new("priority"));
    }
    i32::try_from(priority).map_err(|_| InvalidRuleError::new("priority"))
}

/// 36 characters of hex digits and dashes.
pub fn is_uuid_shaped(raw: &str) -> bool {
    raw.len() == 36 && raw.chars().all(|ch| ch.is_ascii_hexdigit() || ch == '-')
}

fn validate_target(value: &Value, code: &str) -> Result<AssignTarget, InvalidRuleError> {
    let invalid = || InvalidRuleError::new(code);
    let object = value.as_object().ok_or_else(invalid)?;
    let uuid_field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .filter(|raw| is_uuid_shaped(raw))
            .map(str::to_owned)
            .ok_or_else(invalid)
    };

    match object.get("type").and_then(Value::as_str) {
        Some("team") => Ok(AssignTarget::Team { team_id: uuid_field("teamId")? }),
        Some("vendor") => {
            Ok(AssignTarget::Vendor { external_vendor_id: uuid_field("externalVendorId")? })
        }
        _ => Err(invalid()),
    }
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn reject_unknown_keys(
    object: &Map<String, Value>,
    allowed: &[&str],
    prefix: &str,
) -> Result<(), InvalidRuleError> {
    match object.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(unknown) => Err(InvalidRuleError::new(format!("{prefix}.{unknown}"))),
        None => Ok(()),
    }
}

fn optional_string(
    object: &Map<String, Value>,
    key: &str,
    code: &str,
) -> Result<Option<String>, InvalidRuleError> {
    match present(object, key) {
        None => Ok(None),
        Some(Value::String(raw)) if !raw.trim().is_empty() => Ok(Some(raw.clone())),
        Some(_) => Err(InvalidRuleError::new(code)),
    }
}

fn optional_string_list(
    object: &Map<String, Value>,
    key: &str,
    code: &str,
) -> Result<Option<Vec<String>>, InvalidRuleError> {
    let Some(raw) = present(object, key) else {
        return Ok(None);
    };
    let items = raw.as_array().ok_or_else(|| InvalidRuleError::new(code))?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned).ok_or_else(|| InvalidRuleError::new(code)))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn optional_int_list(
    object: &Map<String, Value>,
    key: &str,
    code: &str,
) -> Result<Option<Vec<i64>>, InvalidRuleError> {
    let Some(raw) = present(object, key) else {
        return Ok(None);
    };
    let items = raw.as_array().ok_or_else(|| InvalidRuleError::new(code))?;
    items
        .iter()
        .map(|item| item.as_i64().ok_or_else(|| InvalidRuleError::new(code)))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn optional_time_window(
    object: &Map<String, Value>,
) -> Result<Option<TimeWindow>, InvalidRuleError> {
    match present(object, "timeWindow") {
        None => Ok(None),
        Some(raw) => raw
            .as_str()
            .and_then(TimeWindow::parse)
            .map(Some)
            .ok_or_else(|| InvalidRuleError::new("condition.timeWindow")),
    }
}
