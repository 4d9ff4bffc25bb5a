pub mod adapters;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use adapters::{sql_routing_ports, sql_strategy_registry};
pub use connection::{connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoDataset, SeedResult, VerificationResult};
pub use repositories::RepositoryError;
