use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use automarket_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let chat_ids = config
        .telegram
        .admin_chat_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "AUTOMARKET_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "AUTOMARKET_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "AUTOMARKET_DATABASE_TIMEOUT_SECS"),
    ));
    lines.push(render_line(
        "telegram.bot_token",
        &redact_bot_token(config.telegram.bot_token.expose_secret()),
        source("telegram.bot_token", "AUTOMARKET_BOT_TOKEN"),
    ));
    lines.push(render_line(
        "telegram.webhook_secret",
        "<redacted>",
        source("telegram.webhook_secret", "AUTOMARKET_WEBHOOK_SECRET"),
    ));
    lines.push(render_line(
        "telegram.admin_chat_ids",
        if chat_ids.is_empty() { "<unset>" } else { &chat_ids },
        source("telegram.admin_chat_ids", "AUTOMARKET_ADMIN_CHAT_IDS"),
    ));
    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "AUTOMARKET_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "AUTOMARKET_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.public_url",
        &config.server.public_url,
        source("server.public_url", "AUTOMARKET_PUBLIC_URL"),
    ));
    lines.push(render_line(
        "admin.password",
        "<redacted>",
        source("admin.password", "AUTOMARKET_ADMIN_PASSWORD"),
    ));
    lines.push(render_line(
        "admin.session_ttl_hours",
        &config.admin.session_ttl_hours.to_string(),
        source("admin.session_ttl_hours", "AUTOMARKET_ADMIN_SESSION_TTL_HOURS"),
    ));
    lines.push(render_line(
        "admin.upload_dir",
        &config.admin.upload_dir,
        source("admin.upload_dir", "AUTOMARKET_UPLOAD_DIR"),
    ));
    lines.push(render_line(
        "admin.max_photos_per_car",
        &config.admin.max_photos_per_car.to_string(),
        source("admin.max_photos_per_car", "AUTOMARKET_ADMIN_MAX_PHOTOS"),
    ));
    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "AUTOMARKET_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "AUTOMARKET_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("automarket.toml"), PathBuf::from("config/automarket.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
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

/// Only the numeric bot id survives; that part is visible in webhook logs
/// anyway and makes it possible to tell bots apart.
fn redact_bot_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((bot_id, _)) = trimmed.split_once(':') {
        return format!("{bot_id}:***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::redact_bot_token;

    #[test]
    fn bot_token_redaction_keeps_only_the_numeric_id() {
        assert_eq!(redact_bot_token("123456:super-secret"), "123456:***");
        assert_eq!(redact_bot_token(""), "<empty>");
        assert_eq!(redact_bot_token("no-colon-here"), "<redacted>");
    }
}
