use ticketroute_db::migrations;

use crate::commands::{connect, load_config, runtime, CommandResult, Failure, EXIT_MIGRATION};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("migrate") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        let version = migrations::applied_version(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;
        pool.close().await;
        Ok::<Option<i64>, Failure>(version)
    });

    match result {
        Ok(Some(version)) => {
            CommandResult::success("migrate", format!("schema at migration {version}"))
        }
        Ok(None) => CommandResult::success("migrate", "no migrations to apply"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
