//! Configuration loader and validator for the homework status bot.
//!
//! Settings come from an optional YAML file; credentials and the endpoint
//! may be overridden from the environment (a `.env` file is honoured by the
//! binaries through `dotenvy`).
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use teloxide::types::{ChatId, Recipient};
use thiserror::Error;

use crate::model::CursorPolicy;
use crate::poller::PollSettings;
use crate::tracking::PRACTICUM_ENDPOINT;

pub const ENV_PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_PRACTICUM_ENDPOINT: &str = "PRACTICUM_ENDPOINT";

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub practicum: Practicum,
    pub telegram: Telegram,
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    pub retry_period_secs: u64,
    pub request_timeout_secs: u64,
    pub advance_cursor_on: CursorPolicy,
    pub notify_errors: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            retry_period_secs: 600,
            request_timeout_secs: 30,
            advance_cursor_on: CursorPolicy::default(),
            notify_errors: false,
        }
    }
}

/// Tracking API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Practicum {
    pub endpoint: String,
    pub token: String,
}

impl Default for Practicum {
    fn default() -> Self {
        Self {
            endpoint: PRACTICUM_ENDPOINT.to_string(),
            token: String::new(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Telegram {
    pub bot_token: String,
    pub chat_id: Option<ChatTarget>,
}

/// Destination chat: a numeric id or a public `@channelusername`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

impl ChatTarget {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => ChatTarget::Id(id),
            Err(_) => ChatTarget::Username(raw.to_string()),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, ChatTarget::Username(name) if name.trim().is_empty())
    }

    pub fn recipient(&self) -> Recipient {
        match self {
            ChatTarget::Id(id) => Recipient::Id(ChatId(*id)),
            ChatTarget::Username(name) => match name.trim().parse::<i64>() {
                Ok(id) => Recipient::Id(ChatId(id)),
                Err(_) => Recipient::ChannelUsername(name.trim().to_string()),
            },
        }
    }
}

impl Config {
    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.app.retry_period_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs)
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.practicum.endpoint)
            .map_err(|err| ConfigError::Invalid(format!("practicum.endpoint: {err}")))
    }

    /// Destination chat; only meaningful on a config that passed validation.
    pub fn recipient(&self) -> Recipient {
        self.telegram
            .chat_id
            .as_ref()
            .map(ChatTarget::recipient)
            .unwrap_or(Recipient::Id(ChatId(0)))
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            retry_period: self.retry_period(),
            advance_cursor_on: self.app.advance_cursor_on,
            notify_errors: self.app.notify_errors,
        }
    }

    /// Overlay values found through `lookup` (normally the process
    /// environment). Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = get(ENV_PRACTICUM_TOKEN) {
            self.practicum.token = token;
        }
        if let Some(endpoint) = get(ENV_PRACTICUM_ENDPOINT) {
            self.practicum.endpoint = endpoint;
        }
        if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(raw) = get(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(ChatTarget::parse(&raw));
        }
    }
}

/// Load configuration from the process environment and an optional YAML
/// file, then validate it.
/// - If `path` is None, `config.yaml` in the working directory is read when
///   present and silently skipped otherwise.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Like [`load`], with an explicit variable lookup.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = match path {
        Some(path) => parse_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            parse_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => Config::default(),
    };
    cfg.apply_env(lookup);
    validate(&cfg)?;
    Ok(cfg)
}

fn parse_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.practicum.token.trim().is_empty() {
        return Err(ConfigError::Missing(ENV_PRACTICUM_TOKEN));
    }
    if cfg.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::Missing(ENV_TELEGRAM_TOKEN));
    }
    if cfg.telegram.chat_id.as_ref().map_or(true, ChatTarget::is_blank) {
        return Err(ConfigError::Missing(ENV_TELEGRAM_CHAT_ID));
    }
    if cfg.app.retry_period_secs == 0 {
        return Err(ConfigError::Invalid("app.retry_period_secs must be > 0".into()));
    }
    if cfg.app.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("app.request_timeout_secs must be > 0".into()));
    }
    cfg.endpoint_url()?;
    Ok(())
}

/// Example YAML shipped with the bot.
pub fn example() -> &'static str {
    r#"app:
  retry_period_secs: 600
  request_timeout_secs: 30
  advance_cursor_on: every-cycle
  notify_errors: false

practicum:
  endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/"
  token: "YOUR_PRACTICUM_TOKEN"

telegram:
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  chat_id: 123456789
"#
}
