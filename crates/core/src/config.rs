use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub webhook_secret: String,
    pub admin_chat_ids: Vec<i64>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub public_url: String,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub password: SecretString,
    pub session_ttl_hours: u64,
    pub upload_dir: String,
    pub max_photos_per_car: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bot_token: Option<String>,
    pub webhook_secret: Option<String>,
    pub public_url: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://automarket.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            telegram: TelegramConfig {
                bot_token: String::new().into(),
                webhook_secret: String::new(),
                admin_chat_ids: Vec::new(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                public_url: "http://localhost:8080".to_string(),
                graceful_shutdown_secs: 15,
            },
            admin: AdminConfig {
                password: String::new().into(),
                session_ttl_hours: 30 * 24,
                upload_dir: "uploads".to_string(),
                max_photos_per_car: 5,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("automarket.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.normalize();
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(telegram) = patch.telegram {
            if let Some(bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token_value);
            }
            if let Some(webhook_secret) = telegram.webhook_secret {
                self.telegram.webhook_secret = webhook_secret;
            }
            if let Some(admin_chat_ids) = telegram.admin_chat_ids {
                self.telegram.admin_chat_ids = admin_chat_ids;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(public_url) = server.public_url {
                self.server.public_url = public_url;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(admin) = patch.admin {
            if let Some(password_value) = admin.password {
                self.admin.password = secret_value(password_value);
            }
            if let Some(session_ttl_hours) = admin.session_ttl_hours {
                self.admin.session_ttl_hours = session_ttl_hours;
            }
            if let Some(upload_dir) = admin.upload_dir {
                self.admin.upload_dir = upload_dir;
            }
            if let Some(max_photos_per_car) = admin.max_photos_per_car {
                self.admin.max_photos_per_car = max_photos_per_car;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("AUTOMARKET_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("AUTOMARKET_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("AUTOMARKET_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("AUTOMARKET_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("AUTOMARKET_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("AUTOMARKET_BOT_TOKEN") {
            self.telegram.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("AUTOMARKET_WEBHOOK_SECRET") {
            self.telegram.webhook_secret = value;
        }
        if let Some(value) = read_env("AUTOMARKET_ADMIN_CHAT_IDS") {
            self.telegram.admin_chat_ids = parse_chat_ids(&value);
        }

        if let Some(value) = read_env("AUTOMARKET_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("AUTOMARKET_SERVER_PORT") {
            self.server.port = parse_u16("AUTOMARKET_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("AUTOMARKET_PUBLIC_URL") {
            self.server.public_url = value;
        }
        if let Some(value) = read_env("AUTOMARKET_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("AUTOMARKET_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("AUTOMARKET_ADMIN_PASSWORD") {
            self.admin.password = secret_value(value);
        }
        if let Some(value) = read_env("AUTOMARKET_ADMIN_SESSION_TTL_HOURS") {
            self.admin.session_ttl_hours =
                parse_u64("AUTOMARKET_ADMIN_SESSION_TTL_HOURS", &value)?;
        }
        if let Some(value) = read_env("AUTOMARKET_UPLOAD_DIR") {
            self.admin.upload_dir = value;
        }
        if let Some(value) = read_env("AUTOMARKET_ADMIN_MAX_PHOTOS") {
            self.admin.max_photos_per_car = parse_u32("AUTOMARKET_ADMIN_MAX_PHOTOS", &value)?;
        }

        let log_level =
            read_env("AUTOMARKET_LOGGING_LEVEL").or_else(|| read_env("AUTOMARKET_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("AUTOMARKET_LOGGING_FORMAT").or_else(|| read_env("AUTOMARKET_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bot_token) = overrides.bot_token {
            self.telegram.bot_token = secret_value(bot_token);
        }
        if let Some(webhook_secret) = overrides.webhook_secret {
            self.telegram.webhook_secret = webhook_secret;
        }
        if let Some(public_url) = overrides.public_url {
            self.server.public_url = public_url;
        }
        if let Some(admin_password) = overrides.admin_password {
            self.admin.password = secret_value(admin_password);
        }
    }

    fn normalize(&mut self) {
        while self.server.public_url.ends_with('/') {
            self.server.public_url.pop();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_telegram(&self.telegram)?;
        validate_server(&self.server)?;
        validate_admin(&self.admin)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// Webhook path derived from the configured secret, e.g. `/tg/webhook/abc`.
    pub fn webhook_path(&self) -> String {
        format!("/tg/webhook/{}", self.telegram.webhook_secret)
    }

    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.server.public_url, self.webhook_path())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("automarket.toml"), PathBuf::from("config/automarket.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

/// Comma-separated chat id list; non-numeric fragments are dropped.
fn parse_chat_ids(raw: &str) -> Vec<i64> {
    raw.split(',').filter_map(|part| part.trim().parse::<i64>().ok()).collect()
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required. Get one from @BotFather with /newbot".to_string(),
        ));
    }
    let looks_like_token = bot_token
        .split_once(':')
        .is_some_and(|(id, rest)| {
            !id.is_empty() && id.chars().all(|ch| ch.is_ascii_digit()) && !rest.is_empty()
        });
    if !looks_like_token {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<numeric id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    if telegram.webhook_secret.trim().is_empty() {
        return Err(ConfigError::Validation(
            "telegram.webhook_secret is required; it becomes part of the webhook URL, use a long random value".to_string(),
        ));
    }
    if telegram.webhook_secret.len() < 16 {
        return Err(ConfigError::Validation(
            "telegram.webhook_secret must be at least 16 characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    let public_url = server.public_url.trim();
    if !public_url.starts_with("http://") && !public_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "server.public_url must start with http:// or https://".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_admin(admin: &AdminConfig) -> Result<(), ConfigError> {
    if admin.password.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "admin.password is required. Set AUTOMARKET_ADMIN_PASSWORD or [admin].password"
                .to_string(),
        ));
    }

    if admin.session_ttl_hours == 0 {
        return Err(ConfigError::Validation(
            "admin.session_ttl_hours must be greater than zero".to_string(),
        ));
    }

    if admin.upload_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "admin.upload_dir must not be empty".to_string(),
        ));
    }

    if admin.max_photos_per_car == 0 || admin.max_photos_per_car > 10 {
        return Err(ConfigError::Validation(
            "admin.max_photos_per_car must be in range 1..=10".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    telegram: Option<TelegramPatch>,
    server: Option<ServerPatch>,
    admin: Option<AdminPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    webhook_secret: Option<String>,
    admin_chat_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    public_url: Option<String>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AdminPatch {
    password: Option<String>,
    session_ttl_hours: Option<u64>,
    upload_dir: Option<String>,
    max_photos_per_car: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
