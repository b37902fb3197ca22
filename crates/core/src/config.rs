use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub notion: NotionConfig,
    pub email: EmailConfig,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
    /// Directory of pre-built marketing pages served as a fallback; API
    /// routes take precedence. `None` disables static serving.
    pub static_dir: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NotionConfig {
    pub api_token: Option<SecretString>,
    pub database_id: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub api_key: Option<SecretString>,
    pub from_address: Option<String>,
    pub reply_to: Option<String>,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: Option<SecretString>,
    pub chat_id: Option<String>,
    /// Topic thread id for community groups with topics enabled.
    pub message_thread_id: Option<i64>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
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
    pub environment: Option<Environment>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub notion_api_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from_address: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
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
            environment: Environment::Development,
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                health_check_port: 8081,
                graceful_shutdown_secs: 15,
                static_dir: None,
            },
            notion: NotionConfig { api_token: None, database_id: None, timeout_secs: 30 },
            email: EmailConfig {
                api_key: None,
                from_address: None,
                reply_to: None,
                max_retries: 3,
                retry_base_delay_ms: 500,
                timeout_secs: 30,
            },
            telegram: TelegramConfig {
                bot_token: None,
                chat_id: None,
                message_thread_id: None,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::Validation(format!(
                "unsupported environment `{other}` (expected development|production)"
            ))),
        }
    }
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
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("intake.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(environment) = patch.environment {
            self.environment = environment;
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(static_dir) = server.static_dir {
                self.server.static_dir = Some(static_dir);
            }
        }

        if let Some(notion) = patch.notion {
            if let Some(notion_api_token_value) = notion.api_token {
                self.notion.api_token = Some(secret_value(notion_api_token_value));
            }
            if let Some(database_id) = notion.database_id {
                self.notion.database_id = Some(database_id);
            }
            if let Some(timeout_secs) = notion.timeout_secs {
                self.notion.timeout_secs = timeout_secs;
            }
        }

        if let Some(email) = patch.email {
            if let Some(email_api_key_value) = email.api_key {
                self.email.api_key = Some(secret_value(email_api_key_value));
            }
            if let Some(from_address) = email.from_address {
                self.email.from_address = Some(from_address);
            }
            if let Some(reply_to) = email.reply_to {
                self.email.reply_to = Some(reply_to);
            }
            if let Some(max_retries) = email.max_retries {
                self.email.max_retries = max_retries;
            }
            if let Some(retry_base_delay_ms) = email.retry_base_delay_ms {
                self.email.retry_base_delay_ms = retry_base_delay_ms;
            }
            if let Some(timeout_secs) = email.timeout_secs {
                self.email.timeout_secs = timeout_secs;
            }
        }

        if let Some(telegram) = patch.telegram {
            if let Some(telegram_bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = Some(secret_value(telegram_bot_token_value));
            }
            if let Some(chat_id) = telegram.chat_id {
                self.telegram.chat_id = Some(chat_id);
            }
            if let Some(message_thread_id) = telegram.message_thread_id {
                self.telegram.message_thread_id = Some(message_thread_id);
            }
            if let Some(timeout_secs) = telegram.timeout_secs {
                self.telegram.timeout_secs = timeout_secs;
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
        if let Some(value) = read_env("INTAKE_ENVIRONMENT") {
            self.environment = value.parse()?;
        }

        if let Some(value) = read_env("INTAKE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("INTAKE_SERVER_PORT") {
            self.server.port = parse_u16("INTAKE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("INTAKE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("INTAKE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("INTAKE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("INTAKE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("INTAKE_SERVER_STATIC_DIR") {
            self.server.static_dir = Some(value);
        }

        if let Some(value) = read_env("INTAKE_NOTION_API_TOKEN") {
            self.notion.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("INTAKE_NOTION_DATABASE_ID") {
            self.notion.database_id = Some(value);
        }
        if let Some(value) = read_env("INTAKE_NOTION_TIMEOUT_SECS") {
            self.notion.timeout_secs = parse_u64("INTAKE_NOTION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("INTAKE_EMAIL_API_KEY") {
            self.email.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("INTAKE_EMAIL_FROM_ADDRESS") {
            self.email.from_address = Some(value);
        }
        if let Some(value) = read_env("INTAKE_EMAIL_REPLY_TO") {
            self.email.reply_to = Some(value);
        }
        if let Some(value) = read_env("INTAKE_EMAIL_MAX_RETRIES") {
            self.email.max_retries = parse_u32("INTAKE_EMAIL_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("INTAKE_EMAIL_RETRY_BASE_DELAY_MS") {
            self.email.retry_base_delay_ms =
                parse_u64("INTAKE_EMAIL_RETRY_BASE_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("INTAKE_EMAIL_TIMEOUT_SECS") {
            self.email.timeout_secs = parse_u64("INTAKE_EMAIL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("INTAKE_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("INTAKE_TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(value);
        }
        if let Some(value) = read_env("INTAKE_TELEGRAM_MESSAGE_THREAD_ID") {
            self.telegram.message_thread_id =
                Some(parse_i64("INTAKE_TELEGRAM_MESSAGE_THREAD_ID", &value)?);
        }
        if let Some(value) = read_env("INTAKE_TELEGRAM_TIMEOUT_SECS") {
            self.telegram.timeout_secs = parse_u64("INTAKE_TELEGRAM_TIMEOUT_SECS", &value)?;
        }

        let log_level = read_env("INTAKE_LOGGING_LEVEL").or_else(|| read_env("INTAKE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("INTAKE_LOGGING_FORMAT").or_else(|| read_env("INTAKE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(environment) = overrides.environment {
            self.environment = environment;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(notion_api_token) = overrides.notion_api_token {
            self.notion.api_token = Some(secret_value(notion_api_token));
        }
        if let Some(notion_database_id) = overrides.notion_database_id {
            self.notion.database_id = Some(notion_database_id);
        }
        if let Some(email_api_key) = overrides.email_api_key {
            self.email.api_key = Some(secret_value(email_api_key));
        }
        if let Some(email_from_address) = overrides.email_from_address {
            self.email.from_address = Some(email_from_address);
        }
        if let Some(telegram_bot_token) = overrides.telegram_bot_token {
            self.telegram.bot_token = Some(secret_value(telegram_bot_token));
        }
        if let Some(telegram_chat_id) = overrides.telegram_chat_id {
            self.telegram.chat_id = Some(telegram_chat_id);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_notion(&self.notion)?;
        validate_email(&self.email)?;
        validate_telegram(&self.telegram)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("intake.toml"), PathBuf::from("config/intake.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_notion(notion: &NotionConfig) -> Result<(), ConfigError> {
    let has_token = notion
        .api_token
        .as_ref()
        .map(|value| !value.expose_secret().trim().is_empty())
        .unwrap_or(false);
    let has_database = notion.database_id.as_ref().map(|v| !v.trim().is_empty()).unwrap_or(false);

    if has_token && !has_database {
        return Err(ConfigError::Validation(
            "notion.api_token is set but notion.database_id is missing".to_string(),
        ));
    }
    if has_database && !has_token {
        return Err(ConfigError::Validation(
            "notion.database_id is set but notion.api_token is missing. Get a token from https://www.notion.so/my-integrations".to_string(),
        ));
    }

    if notion.timeout_secs == 0 || notion.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "notion.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_email(email: &EmailConfig) -> Result<(), ConfigError> {
    if let Some(api_key) = &email.api_key {
        let api_key = api_key.expose_secret();
        if !api_key.starts_with("re_") {
            return Err(ConfigError::Validation(
                "email.api_key must start with `re_`. Get it from https://resend.com/api-keys"
                    .to_string(),
            ));
        }

        let from_missing =
            email.from_address.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
        if from_missing {
            return Err(ConfigError::Validation(
                "email.from_address is required when email.api_key is set".to_string(),
            ));
        }
    }

    if let Some(from_address) = &email.from_address {
        if !from_address.contains('@') {
            return Err(ConfigError::Validation(
                "email.from_address must be an email address".to_string(),
            ));
        }
    }

    if email.max_retries > 10 {
        return Err(ConfigError::Validation("email.max_retries must be at most 10".to_string()));
    }

    if email.retry_base_delay_ms == 0 || email.retry_base_delay_ms > 60_000 {
        return Err(ConfigError::Validation(
            "email.retry_base_delay_ms must be in range 1..=60000".to_string(),
        ));
    }

    if email.timeout_secs == 0 || email.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "email.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let has_token = telegram
        .bot_token
        .as_ref()
        .map(|value| !value.expose_secret().trim().is_empty())
        .unwrap_or(false);
    let has_chat = telegram.chat_id.as_ref().map(|v| !v.trim().is_empty()).unwrap_or(false);

    if has_token && !has_chat {
        return Err(ConfigError::Validation(
            "telegram.bot_token is set but telegram.chat_id is missing".to_string(),
        ));
    }
    if has_chat && !has_token {
        return Err(ConfigError::Validation(
            "telegram.chat_id is set but telegram.bot_token is missing. Create a bot with @BotFather to get one".to_string(),
        ));
    }

    if telegram.timeout_secs == 0 || telegram.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "telegram.timeout_secs must be in range 1..=300".to_string(),
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

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    environment: Option<Environment>,
    server: Option<ServerPatch>,
    notion: Option<NotionPatch>,
    email: Option<EmailPatch>,
    telegram: Option<TelegramPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    static_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotionPatch {
    api_token: Option<String>,
    database_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    api_key: Option<String>,
    from_address: Option<String>,
    reply_to: Option<String>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    chat_id: Option<String>,
    message_thread_id: Option<i64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, Environment, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_NOTION_TOKEN", "secret-from-env");
        env::set_var("TEST_NOTION_DATABASE", "db-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("intake.toml");
            fs::write(
                &path,
                r#"
[notion]
api_token = "${TEST_NOTION_TOKEN}"
database_id = "${TEST_NOTION_DATABASE}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let token = config.notion.api_token.as_ref().map(|t| t.expose_secret().to_string());
            ensure(
                token.as_deref() == Some("secret-from-env"),
                "notion token should be loaded from environment",
            )?;
            ensure(
                config.notion.database_id.as_deref() == Some("db-from-env"),
                "notion database id should be loaded from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_NOTION_TOKEN", "TEST_NOTION_DATABASE"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("INTAKE_LOG_LEVEL", "warn");
        env::set_var("INTAKE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["INTAKE_LOG_LEVEL", "INTAKE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("INTAKE_TELEGRAM_BOT_TOKEN", "token-from-env");
        env::set_var("INTAKE_TELEGRAM_CHAT_ID", "-100200300");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("intake.toml");
            fs::write(
                &path,
                r#"
environment = "production"

[telegram]
bot_token = "token-from-file"
chat_id = "-111"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                matches!(config.environment, Environment::Production),
                "environment should come from the file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should win")?;
            let bot_token =
                config.telegram.bot_token.as_ref().map(|t| t.expose_secret().to_string());
            ensure(
                bot_token.as_deref() == Some("token-from-env"),
                "env bot token should win over file and defaults",
            )?;
            ensure(
                config.telegram.chat_id.as_deref() == Some("-100200300"),
                "env chat id should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["INTAKE_TELEGRAM_BOT_TOKEN", "INTAKE_TELEGRAM_CHAT_ID"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("INTAKE_EMAIL_API_KEY", "not-a-resend-key");
        env::set_var("INTAKE_EMAIL_FROM_ADDRESS", "quotes@example.com");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("email.api_key")
            );
            ensure(has_message, "validation failure should mention email.api_key")
        })();

        clear_vars(&["INTAKE_EMAIL_API_KEY", "INTAKE_EMAIL_FROM_ADDRESS"]);
        result
    }

    #[test]
    fn paired_credentials_must_be_complete() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("INTAKE_NOTION_API_TOKEN", "secret-token");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("token without database id should fail".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("notion.database_id")
            );
            ensure(has_message, "validation failure should mention notion.database_id")
        })();

        clear_vars(&["INTAKE_NOTION_API_TOKEN"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("INTAKE_NOTION_API_TOKEN", "notion-secret-value");
        env::set_var("INTAKE_NOTION_DATABASE_ID", "db-123");
        env::set_var("INTAKE_EMAIL_API_KEY", "re_email-secret-value");
        env::set_var("INTAKE_EMAIL_FROM_ADDRESS", "quotes@example.com");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("notion-secret-value"),
                "debug output should not contain the notion token",
            )?;
            ensure(
                !debug.contains("re_email-secret-value"),
                "debug output should not contain the email api key",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "INTAKE_NOTION_API_TOKEN",
            "INTAKE_NOTION_DATABASE_ID",
            "INTAKE_EMAIL_API_KEY",
            "INTAKE_EMAIL_FROM_ADDRESS",
        ]);
        result
    }
}
