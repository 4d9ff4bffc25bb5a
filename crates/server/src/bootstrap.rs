use thiserror::Error;
use ticketroute_core::config::{AppConfig, ConfigError, LoadOptions};
use ticketroute_core::RoutingService;
use ticketroute_db::{
    connect_with_config, migrations, sql_routing_ports, sql_strategy_registry, DbPool,
};
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub routing: RoutingService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let routing = RoutingService::with_super_admin_scope(
        sql_routing_ports(&db_pool),
        sql_strategy_registry(&db_pool, config.routing.cursor_store),
        &config.routing.super_admin_scope,
    );
    info!(
        event_name = "system.bootstrap.routing_ready",
        correlation_id = "bootstrap",
        cursor_store = config.routing.cursor_store.as_str(),
        "routing service initialized"
    );

    Ok(Application { config, db_pool, routing })
}
