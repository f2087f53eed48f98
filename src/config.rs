//! Client configuration: defaults, JSON files and environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;
use crate::retry::JitterStrategy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api/v1";
pub const DEFAULT_TOKEN_KEY: &str = "job_board_token";
pub const DEFAULT_REFRESH_TOKEN_KEY: &str = "job_board_refresh_token";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(Error::Config(format!(
                "Unknown environment '{}'; expected development, test or production",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_ms: u64,
    pub token_key: String,
    pub refresh_token_key: String,
    /// Remaining access-token lifetime below which a refresh is due.
    pub refresh_threshold_ms: u64,
    pub proactive_refresh: bool,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub refresh_path: String,
    pub refresh_timeout_ms: u64,
    pub login_route: String,
    pub environment: Environment,
    pub token_file: Option<PathBuf>,
    pub cache_max_size: usize,
    pub cache_ttl_ms: u64,
    pub cache_sweep_interval_ms: u64,
    pub max_retries: u8,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter: JitterStrategy,
    pub retry_idempotent_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            refresh_token_key: DEFAULT_REFRESH_TOKEN_KEY.to_string(),
            refresh_threshold_ms: 300_000,
            proactive_refresh: true,
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            refresh_path: "/auth/refresh".to_string(),
            refresh_timeout_ms: 5_000,
            login_route: "/auth/login".to_string(),
            environment: Environment::Development,
            token_file: None,
            cache_max_size: 100,
            cache_ttl_ms: 5 * 60 * 1000,
            cache_sweep_interval_ms: 60_000,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
            retry_jitter: JitterStrategy::None,
            retry_idempotent_only: false,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys fall back to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by whichever `JOB_BOARD_*` variables are set.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Config::default();
        if let Some(url) = env_var("JOB_BOARD_API_URL") {
            config.base_url = url;
        }
        if let Some(timeout) = env_var("JOB_BOARD_API_TIMEOUT") {
            config.timeout_ms = parse_number("JOB_BOARD_API_TIMEOUT", &timeout)?;
        }
        if let Some(key) = env_var("JOB_BOARD_TOKEN_STORAGE_KEY") {
            config.token_key = key;
        }
        if let Some(key) = env_var("JOB_BOARD_REFRESH_TOKEN_STORAGE_KEY") {
            config.refresh_token_key = key;
        }
        if let Some(threshold) = env_var("JOB_BOARD_JWT_REFRESH_THRESHOLD") {
            config.refresh_threshold_ms =
                parse_number("JOB_BOARD_JWT_REFRESH_THRESHOLD", &threshold)?;
        }
        if let Some(env) = env_var("JOB_BOARD_ENV") {
            config.environment = env.parse()?;
        }
        if let Some(path) = env_var("JOB_BOARD_TOKEN_FILE") {
            config.token_file = Some(PathBuf::from(path));
        }
        if let Some(jitter) = env_var("JOB_BOARD_RETRY_JITTER") {
            config.retry_jitter = jitter.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        reqwest::Url::parse(&self.base_url).map_err(|e| {
            Error::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        if self.cache_max_size == 0 {
            return Err(Error::Config("cache_max_size must be > 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be > 0".into()));
        }
        if self.cache_sweep_interval_ms == 0 {
            return Err(Error::Config("cache_sweep_interval_ms must be > 0".into()));
        }
        if self.refresh_threshold_ms == 0 {
            return Err(Error::Config("refresh_threshold_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn with_retry(mut self, max_retries: u8, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay_ms = base_delay.as_millis() as u64;
        self
    }

    pub fn with_cache(mut self, max_size: usize, ttl: Duration) -> Self {
        self.cache_max_size = max_size;
        self.cache_ttl_ms = ttl.as_millis() as u64;
        self
    }

    pub fn with_proactive_refresh(mut self, enabled: bool) -> Self {
        self.proactive_refresh = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_millis(self.refresh_threshold_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.cache_sweep_interval_ms)
    }

    /// Tokens are flagged secure only outside development and test.
    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_number(name: &str, value: &str) -> Result<u64, Error> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} must be an integer, got '{}'", name, value)))
}
