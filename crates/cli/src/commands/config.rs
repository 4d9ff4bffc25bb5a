use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ticketroute_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// Renders every effective setting with where its value came from.
pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = SourceLookup { path: config_file_path, doc: config_file_doc };

    let fields: [(&str, String, &[&str]); 10] = [
        ("database.url", config.database.url.clone(), &["TICKETROUTE_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["TICKETROUTE_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["TICKETROUTE_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["TICKETROUTE_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["TICKETROUTE_SERVER_PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["TICKETROUTE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "routing.cursor_store",
            config.routing.cursor_store.as_str().to_string(),
            &["TICKETROUTE_ROUTING_CURSOR_STORE"],
        ),
        (
            "routing.super_admin_scope",
            config.routing.super_admin_scope.clone(),
            &["TICKETROUTE_ROUTING_SUPER_ADMIN_SCOPE"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["TICKETROUTE_LOGGING_LEVEL", "TICKETROUTE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["TICKETROUTE_LOGGING_FORMAT", "TICKETROUTE_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in &fields {
        lines.push(render_line(key, value, sources.field_source(key, env_keys)));
    }
    lines.join("\n")
}

struct SourceLookup {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

impl SourceLookup {
    fn field_source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
