//! Runtime configuration read from environment variables.
//!
//! Every setting has a default, so an empty environment yields a working
//! local configuration. Malformed values are rejected at startup with
//! [`ConfigError::InvalidValue`] rather than silently replaced.

use crate::task::adapters::openai::{DEFAULT_OPENAI_URL, OpenAiConfig};
use crate::task::domain::GenerationDefaults;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ALLOWED_ORIGINS: [&str; 6] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "https://taskflow-one-gules.vercel.app",
    "https://*.vercel.app",
];

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Raw value found in the environment.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err("expected `text` or `json`".to_owned()),
        }
    }
}

/// HTTP listener and routing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Prefix of the versioned API routes.
    pub api_prefix: String,
    /// Name reported by the service.
    pub project_name: String,
}

impl ServerSettings {
    /// Returns `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiSettings {
    /// API key; `None` when unset or blank.
    pub api_key: Option<String>,
    /// Chat completions endpoint.
    pub base_url: String,
    /// Default model.
    pub model: String,
    /// Default token budget.
    pub max_tokens: u32,
    /// Default sampling temperature.
    pub temperature: f64,
}

/// Credentials for integrations the core does not call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSettings {
    /// Text-to-speech API key.
    pub elevenlabs_api_key: Option<String>,
    /// Vector store directory.
    pub chroma_persist_directory: PathBuf,
}

/// Log subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Default filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Task execution limits.
///
/// Only the duration is enforced; the other two are reported for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLimits {
    /// Deadline for one pipeline run; `None` disables it.
    pub max_task_duration: Option<Duration>,
    /// Advisory concurrency limit.
    pub max_concurrent_tasks: usize,
    /// Advisory request rate limit.
    pub rate_limit_per_minute: u32,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Listener settings.
    pub server: ServerSettings,
    /// Origins allowed by CORS; `scheme://*.suffix` matches subdomains.
    pub allowed_origins: Vec<String>,
    /// Completion provider settings.
    pub openai: OpenAiSettings,
    /// Unused integration settings.
    pub integrations: IntegrationSettings,
    /// Log settings.
    pub logging: LoggingSettings,
    /// Execution limits.
    pub limits: TaskLimits,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let server = ServerSettings {
            host: env.string("HOST", "0.0.0.0"),
            port: env.parse("PORT", 8000)?,
            api_prefix: normalize_prefix(&env.string("API_V1_STR", "/api/v1")),
            project_name: env.string("PROJECT_NAME", "TaskFlow API"),
        };

        let allowed_origins = env.optional("ALLOWED_ORIGINS").map_or_else(
            || DEFAULT_ALLOWED_ORIGINS.into_iter().map(str::to_owned).collect(),
            |raw| split_list(&raw),
        );

        let temperature: f64 = env.parse("OPENAI_TEMPERATURE", 0.7)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid(
                "OPENAI_TEMPERATURE",
                temperature,
                "expected a value between 0.0 and 2.0",
            ));
        }
        let max_tokens: u32 = env.parse("OPENAI_MAX_TOKENS", 4000)?;
        if max_tokens == 0 {
            return Err(invalid("OPENAI_MAX_TOKENS", max_tokens, "must be positive"));
        }
        let openai = OpenAiSettings {
            api_key: env.optional("OPENAI_API_KEY"),
            base_url: env.string("OPENAI_BASE_URL", DEFAULT_OPENAI_URL),
            model: env.string("OPENAI_MODEL", "gpt-4"),
            max_tokens,
            temperature,
        };

        let integrations = IntegrationSettings {
            elevenlabs_api_key: env.optional("ELEVENLABS_API_KEY"),
            chroma_persist_directory: PathBuf::from(
                env.string("CHROMA_PERSIST_DIRECTORY", "./chroma_db"),
            ),
        };

        let logging = LoggingSettings {
            level: env.string("LOG_LEVEL", "info").to_ascii_lowercase(),
            format: env.parse("LOG_FORMAT", LogFormat::Text)?,
        };

        let max_task_secs: u64 = env.parse("MAX_TASK_DURATION", 300)?;
        let limits = TaskLimits {
            max_task_duration: (max_task_secs > 0).then(|| Duration::from_secs(max_task_secs)),
            max_concurrent_tasks: env.parse("MAX_CONCURRENT_TASKS", 5)?,
            rate_limit_per_minute: env.parse("RATE_LIMIT_PER_MINUTE", 60)?,
        };

        Ok(Self {
            server,
            allowed_origins,
            openai,
            integrations,
            logging,
            limits,
        })
    }

    /// Generation defaults applied to requests that omit them.
    #[must_use]
    pub fn generation_defaults(&self) -> GenerationDefaults {
        GenerationDefaults {
            model: self.openai.model.clone(),
            temperature: self.openai.temperature,
            max_tokens: self.openai.max_tokens,
        }
    }

    /// Connection settings for the completion client.
    #[must_use]
    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig::new(self.openai.api_key.clone()).with_base_url(self.openai.base_url.clone())
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_owned())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: err.to_string(),
            }),
            None => Ok(default),
        }
    }
}

fn invalid(key: &'static str, value: impl Display, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_owned(),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Ensures a leading slash and no trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
