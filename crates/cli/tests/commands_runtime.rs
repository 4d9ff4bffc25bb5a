use std::env;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use serde_json::{json, Value};
use ticketroute_cli::commands::simulate::{self, SimulateArgs};
use ticketroute_cli::commands::{doctor, migrate, seed};
use ticketroute_db::fixtures::{
    DEMO_BUILDING_ID, DEMO_COMPANY_ID, DEMO_CONTRACT_VERSION_ID, DEMO_LOCATION_ID, DEMO_SITE_ID,
    TEAM_SOUTH,
};

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("TICKETROUTE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "schema at migration 1");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("TICKETROUTE_DATABASE_URL", "postgres://localhost/routes")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = database_url(&dir.path().join("seed.db"));

    with_env(&[("TICKETROUTE_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");
        let message = first_payload["message"].as_str().unwrap_or_default();
        assert!(message.contains(DEMO_CONTRACT_VERSION_ID), "{message}");
        assert!(message.contains("3 teams, 3 routing rules"), "{message}");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn simulate_runs_routing_against_seeded_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = database_url(&dir.path().join("simulate.db"));
    let context = write_context(dir.path(), "cat-hvac");

    with_env(&[("TICKETROUTE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0, "seed should succeed");

        let result = simulate::run(&args(&context, Some(DEMO_COMPANY_ID)));
        assert_eq!(result.exit_code, 0, "{}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "simulate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["result"]["outcome"]["kind"], "ASSIGNED");
        assert_eq!(payload["result"]["outcome"]["assigneeId"], TEAM_SOUTH);
        assert_eq!(payload["result"]["tiebreakerTrace"][0]["strategy"], "least_load");
    });
}

#[test]
fn simulate_reports_forbidden_for_foreign_actor() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = database_url(&dir.path().join("forbidden.db"));
    let context = write_context(dir.path(), "cat-hvac");

    with_env(&[("TICKETROUTE_DATABASE_URL", url.as_str())], || {
        assert_eq!(seed::run().exit_code, 0, "seed should succeed");

        let result = simulate::run(&args(&context, Some("company-other")));
        assert_eq!(result.exit_code, 8);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "forbidden");
    });
}

#[test]
fn simulate_rejects_missing_context_file() {
    let dir = tempfile::tempdir().expect("temp dir");

    with_env(&[("TICKETROUTE_DATABASE_URL", "sqlite::memory:")], || {
        let result = simulate::run(&args(&dir.path().join("absent.json"), None));
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "context_read");
    });
}

#[test]
fn doctor_flags_unmigrated_schema_then_passes_after_migrate() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = database_url(&dir.path().join("doctor.db"));

    with_env(&[("TICKETROUTE_DATABASE_URL", url.as_str())], || {
        let before = doctor::run(true);
        assert_eq!(before.exit_code, 1);
        let report = parse_payload(&before.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(check_status(&report, "database_connectivity"), "pass");
        assert_eq!(check_status(&report, "schema_migrations"), "fail");

        assert_eq!(migrate::run().exit_code, 0);

        let after = doctor::run(true);
        assert_eq!(after.exit_code, 0, "{}", after.output);
        assert_eq!(parse_payload(&after.output)["overall_status"], "pass");
    });
}

#[test]
fn doctor_skips_database_checks_when_config_is_invalid() {
    with_env(&[("TICKETROUTE_ROUTING_CURSOR_STORE", "redis")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(check_status(&report, "config_validation"), "fail");
        assert_eq!(check_status(&report, "database_connectivity"), "skipped");
        assert_eq!(check_status(&report, "schema_migrations"), "skipped");
    });
}

fn args(context: &Path, company: Option<&str>) -> SimulateArgs {
    SimulateArgs {
        context: context.to_path_buf(),
        actor: "dispatcher-1".to_string(),
        company: company.map(str::to_owned),
        scopes: Vec::new(),
        company_scopes: Vec::new(),
    }
}

fn write_context(dir: &Path, category_id: &str) -> std::path::PathBuf {
    let path = dir.join("context.json");
    let context = json!({
        "companyId": DEMO_COMPANY_ID,
        "siteId": DEMO_SITE_ID,
        "contractVersionId": DEMO_CONTRACT_VERSION_ID,
        "categoryId": category_id,
        "buildingId": DEMO_BUILDING_ID,
        "locationId": DEMO_LOCATION_ID,
        "timeWindow": "business"
    });
    std::fs::write(&path, context.to_string()).expect("write context");
    path
}

fn database_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

fn check_status(report: &Value, name: &str) -> String {
    report["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TICKETROUTE_DATABASE_URL",
        "TICKETROUTE_DATABASE_MAX_CONNECTIONS",
        "TICKETROUTE_DATABASE_TIMEOUT_SECS",
        "TICKETROUTE_SERVER_BIND_ADDRESS",
        "TICKETROUTE_SERVER_PORT",
        "TICKETROUTE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "TICKETROUTE_ROUTING_CURSOR_STORE",
        "TICKETROUTE_ROUTING_SUPER_ADMIN_SCOPE",
        "TICKETROUTE_LOGGING_LEVEL",
        "TICKETROUTE_LOGGING_FORMAT",
        "TICKETROUTE_LOG_LEVEL",
        "TICKETROUTE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    // In-memory databases are per connection; keep the pool to one.
    env::set_var("TICKETROUTE_DATABASE_MAX_CONNECTIONS", "1");
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
