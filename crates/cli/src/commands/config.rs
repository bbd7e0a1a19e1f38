use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadgen_core::config::{AppConfig, LoadOptions, LogFormat};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in effective_values(&config) {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String, &'static [&'static str])> {
    let api_key = config
        .price_source
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        entry("database.url", config.database.url.clone(), &["LEADGEN_DATABASE_URL"]),
        entry(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["LEADGEN_DATABASE_MAX_CONNECTIONS"],
        ),
        entry(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["LEADGEN_DATABASE_TIMEOUT_SECS"],
        ),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["LEADGEN_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["LEADGEN_SERVER_PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["LEADGEN_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry(
            "server.duplicate_sweep_interval_secs",
            config.server.duplicate_sweep_interval_secs.to_string(),
            &["LEADGEN_SERVER_DUPLICATE_SWEEP_INTERVAL_SECS"],
        ),
        entry(
            "price_source.base_url",
            config.price_source.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["LEADGEN_PRICE_SOURCE_BASE_URL"],
        ),
        entry("price_source.api_key", api_key, &["LEADGEN_PRICE_SOURCE_API_KEY"]),
        entry(
            "price_source.timeout_secs",
            config.price_source.timeout_secs.to_string(),
            &["LEADGEN_PRICE_SOURCE_TIMEOUT_SECS"],
        ),
        entry(
            "price_source.item_count",
            config.price_source.item_count.to_string(),
            &["LEADGEN_PRICE_SOURCE_ITEM_COUNT"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["LEADGEN_LOGGING_LEVEL", "LEADGEN_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format_name(config.logging.format).to_string(),
            &["LEADGEN_LOGGING_FORMAT", "LEADGEN_LOG_FORMAT"],
        ),
    ]
}

fn entry(
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key_path, value, env_keys)
}

fn format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("leadgen.toml"), PathBuf::from("config/leadgen.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
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

/// Keeps at most the first four characters of a key.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}
