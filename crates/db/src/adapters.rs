use std::sync::Arc;

use ticketroute_core::config::CursorStore;
use ticketroute_core::routing::ports::RoundRobinCursor;
use ticketroute_core::routing::strategies::{InMemoryRoundRobinCursor, StrategyRegistry};
use ticketroute_core::routing::RoutingPorts;

use crate::repositories::{
    SqlCompetencyQuery, SqlContractQuery, SqlGeoQuery, SqlLoadQuery, SqlRoundRobinCursor,
    SqlRoutingRuleRepository,
};
use crate::DbPool;

/// Contract-side ports backed by the given pool.
pub fn sql_routing_ports(pool: &DbPool) -> RoutingPorts {
    let contracts = Arc::new(SqlContractQuery::new(pool.clone()));
    RoutingPorts {
        contracts: contracts.clone(),
        categories: contracts,
        competency: Arc::new(SqlCompetencyQuery::new(pool.clone())),
        rules: Arc::new(SqlRoutingRuleRepository::new(pool.clone())),
    }
}

/// Standard tiebreak strategies over SQL load and distance data, with the
/// round-robin cursor kept wherever `cursor_store` says.
pub fn sql_strategy_registry(pool: &DbPool, cursor_store: CursorStore) -> StrategyRegistry {
    let cursor: Arc<dyn RoundRobinCursor> = match cursor_store {
        CursorStore::Memory => Arc::new(InMemoryRoundRobinCursor::default()),
        CursorStore::Database => Arc::new(SqlRoundRobinCursor::new(pool.clone())),
    };
    StrategyRegistry::standard(
        Arc::new(SqlLoadQuery::new(pool.clone())),
        Arc::new(SqlGeoQuery::new(pool.clone())),
        cursor,
    )
}
