use crate::error::AppError;
use crate::registry::DEFAULT_CHANNEL_CAPACITY;
use crate::services::StoreKeys;
use dotenvy::dotenv;
use resilience::RetryConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    /// In-process only; nothing survives a restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::Config(format!(
                "STORE_BACKEND must be 'redis' or 'memory', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub store_backend: StoreBackend,
    pub host: String,
    pub port: u16,
    pub graphql_path: String,
    /// Delay between store readiness probes at startup (retried forever)
    pub store_retry_interval: Duration,
    pub store_probe_timeout: Duration,
    pub messages_key: String,
    pub users_key: String,
    pub subscriber_channel_capacity: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_backend: StoreBackend::Redis,
            host: "0.0.0.0".to_string(),
            port: 8080,
            graphql_path: "/graphql".to_string(),
            store_retry_interval: redis_utils::DEFAULT_READY_INTERVAL,
            store_probe_timeout: Duration::from_millis(1000),
            messages_key: "messages".to_string(),
            users_key: "users".to_string(),
            subscriber_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let redis_url = redis_utils::normalize_redis_url(&text("REDIS_URL", defaults.redis_url));
        let store_backend = text("STORE_BACKEND", "redis".into()).parse()?;
        let host = text("SERVER_HOST", defaults.host);
        let port = parse_number("PORT", lookup("PORT"), defaults.port)?;

        let mut graphql_path = text("GRAPHQL_PATH", defaults.graphql_path);
        if !graphql_path.starts_with('/') {
            graphql_path.insert(0, '/');
        }

        let store_retry_interval = Duration::from_millis(parse_number(
            "STORE_RETRY_INTERVAL_MS",
            lookup("STORE_RETRY_INTERVAL_MS"),
            defaults.store_retry_interval.as_millis() as u64,
        )?);
        let store_probe_timeout = Duration::from_millis(parse_number(
            "STORE_PROBE_TIMEOUT_MS",
            lookup("STORE_PROBE_TIMEOUT_MS"),
            defaults.store_probe_timeout.as_millis() as u64,
        )?);

        let subscriber_channel_capacity = parse_number(
            "SUBSCRIBER_CHANNEL_CAPACITY",
            lookup("SUBSCRIBER_CHANNEL_CAPACITY"),
            defaults.subscriber_channel_capacity,
        )?;
        if subscriber_channel_capacity == 0 {
            return Err(AppError::Config(
                "SUBSCRIBER_CHANNEL_CAPACITY must be at least 1".into(),
            ));
        }

        Ok(Self {
            redis_url,
            store_backend,
            host,
            port,
            graphql_path,
            store_retry_interval,
            store_probe_timeout,
            messages_key: text("MESSAGES_KEY", defaults.messages_key),
            users_key: text("USERS_KEY", defaults.users_key),
            subscriber_channel_capacity,
            log_format: text("LOG_FORMAT", "text".into()).parse()?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_keys(&self) -> StoreKeys {
        StoreKeys {
            messages: self.messages_key.clone(),
            users: self.users_key.clone(),
        }
    }

    /// Startup policy: probe the store at a fixed interval until it answers.
    pub fn store_retry_policy(&self) -> RetryConfig {
        RetryConfig::fixed_forever(self.store_retry_interval)
            .with_attempt_timeout(self.store_probe_timeout)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .map_err(|_| AppError::Config(format!("{key} must be a number, got '{value}'"))),
        None => Ok(default),
    }
}
