pub mod evaluate;
pub mod matcher;
pub mod ports;
pub mod resolver;
pub mod rules;
pub mod service;
pub mod strategies;
pub mod tiebreaker;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tracing::debug;

use crate::domain::actor::Actor;
use crate::domain::contract::{ContractVersion, ContractVersionId};
use crate::errors::ApplicationError;

use self::ports::{CompetencyQuery, ContractCategoryQuery, ContractQuery, RoutingRuleRepository};

/// Contract-side collaborators shared by every routing use case.
#[derive(Clone)]
pub struct RoutingPorts {
    pub contracts: Arc<dyn ContractQuery>,
    pub categories: Arc<dyn ContractCategoryQuery>,
    pub competency: Arc<dyn CompetencyQuery>,
    pub rules: Arc<dyn RoutingRuleRepository>,
}

/// Loads the contract version and enforces the actor's company scope on it.
pub(crate) async fn authorize_contract_version(
    contracts: &dyn ContractQuery,
    actor: &Actor,
    contract_version_id: &ContractVersionId,
    super_admin_scope: &str,
) -> Result<ContractVersion, ApplicationError> {
    let contract = contracts.get_contract_version(contract_version_id).await?.ok_or_else(|| {
        ApplicationError::NotFound { entity: "contract version", id: contract_version_id.0.clone() }
    })?;

    if !actor.can_access_company(&contract.company_id, super_admin_scope) {
        debug!(
            event_name = "routing.scope.denied",
            actor_id = %actor.id,
            contract_version_id = %contract_version_id,
            "company scope check denied actor"
        );
        return Err(ApplicationError::Forbidden {
            actor_id: actor.id.clone(),
            company_id: contract.company_id,
        });
    }

    Ok(contract)
}
