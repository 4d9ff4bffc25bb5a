use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::contract::ContractVersionId;

pub const DEFAULT_RULE_PRIORITY: i32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A per-contract-version routing rule. Lower `priority` is evaluated first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    pub id: RuleId,
    pub contract_version_id: ContractVersionId,
    pub priority: i32,
    pub condition: RoutingCondition,
    pub action: RoutingAction,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Business,
    AfterHours,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::AfterHours => "after_hours",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "business" => Some(Self::Business),
            "after_hours" => Some(Self::AfterHours),
            _ => None,
        }
    }
}

/// Recursive match condition. An `AnyOf` node is the OR of its children; a
/// `Match` node is the AND of every guard it carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutingCondition {
    AnyOf {
        #[serde(rename = "anyOf")]
        any_of: Vec<RoutingCondition>,
    },
    Match(ConditionGuards),
}

impl Default for RoutingCondition {
    fn default() -> Self {
        Self::Match(ConditionGuards::default())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConditionGuards {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_in: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_kind_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_any_of: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssignTarget {
    Team {
        #[serde(rename = "teamId")]
        team_id: String,
    },
    Vendor {
        #[serde(rename = "externalVendorId")]
        external_vendor_id: String,
    },
}

impl AssignTarget {
    pub fn team(team_id: impl Into<String>) -> Self {
        Self::Team { team_id: team_id.into() }
    }

    pub fn vendor(external_vendor_id: impl Into<String>) -> Self {
        Self::Vendor { external_vendor_id: external_vendor_id.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStrategy {
    AsListed,
    LeastLoad,
    Nearest,
    RoundRobin,
}

impl OrderStrategy {
    pub const ALL: [OrderStrategy; 4] =
        [Self::AsListed, Self::LeastLoad, Self::Nearest, Self::RoundRobin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AsListed => "as_listed",
            Self::LeastLoad => "least_load",
            Self::Nearest => "nearest",
            Self::RoundRobin => "round_robin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|strategy| strategy.as_str() == raw)
    }
}

/// `assign` is always stored normalized to a list; a scalar target is
/// accepted on the way in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingAction {
    #[serde(deserialize_with = "one_or_many")]
    pub assign: Vec<AssignTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Vec<AssignTarget>>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<AssignTarget>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(AssignTarget),
        Many(Vec<AssignTarget>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(target) => vec![target],
        OneOrMany::Many(targets) => targets,
    })
}
