use serde::{Deserialize, Serialize};

use crate::domain::contract::ContractVersionId;
use crate::domain::rule::TimeWindow;

/// Ticket and contract facts a rule condition is matched against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    pub company_id: String,
    pub site_id: String,
    pub contract_version_id: ContractVersionId,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_kind: Option<String>,
    pub time_window: TimeWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl EvaluationContext {
    /// Key of the round-robin cursor shared by every evaluation for the same
    /// contract version and category.
    pub fn round_robin_key(&self) -> String {
        format!("{}:{}", self.contract_version_id.0, self.category_id)
    }
}
