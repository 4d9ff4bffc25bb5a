use thiserror::Error;

use ticketroute_core::routing::ports::PortError;

pub mod competency;
pub mod contract;
pub mod cursor;
pub mod geo;
pub mod load;
pub mod memory;
pub mod routing_rule;

pub use competency::SqlCompetencyQuery;
pub use contract::SqlContractQuery;
pub use cursor::SqlRoundRobinCursor;
pub use geo::SqlGeoQuery;
pub use load::SqlLoadQuery;
pub use memory::{
    InMemoryContractStore, InMemoryGeoQuery, InMemoryLoadQuery, InMemoryRoutingRuleRepository,
};
pub use routing_rule::SqlRoutingRuleRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for PortError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => PortError::Backend(source.to_string()),
            RepositoryError::Decode(message) => PortError::Decode(message),
        }
    }
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
