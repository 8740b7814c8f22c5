//! Typed configuration for a queue and its backing store.
//!
//! Both structs are built in code (builder style) or loaded from environment
//! variables. Validation happens when a `WorkQueue` is constructed, so a bad
//! value fails fast instead of on the first operation.
//! The store auth secret is wrapped in `secrecy::SecretString` to keep it out
//! of logs and `Debug` output.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{QueueError, Result};

/// Queue-level settings.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue name; every key of the queue is derived from it.
    pub name: String,

    /// A rollback that brings the retry count to this value dead-letters
    /// the message.
    pub max_retries: u32,

    /// How long `get` waits before reporting an empty queue.
    pub wait: Duration,

    /// `true`: one processing marker per message, any number of consumers.
    /// `false`: a single marker per queue, at most one message in flight.
    pub concurrent_consumers: bool,

    /// Namespace prefix for every key.
    pub key_prefix: String,
}

impl QueueConfig {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_WAIT: Duration = Duration::from_secs(3);
    pub const DEFAULT_KEY_PREFIX: &'static str = "RQ";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            wait: Self::DEFAULT_WAIT,
            concurrent_consumers: true,
            key_prefix: Self::DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn concurrent_consumers(mut self, enabled: bool) -> Self {
        self.concurrent_consumers = enabled;
        self
    }

    /// Shorthand for `concurrent_consumers(false)`.
    pub fn single_consumer(self) -> Self {
        self.concurrent_consumers(false)
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(QueueError::Config("queue name can not be empty".into()));
        }
        if self.key_prefix.is_empty() {
            return Err(QueueError::Config("key prefix can not be empty".into()));
        }
        if self.max_retries == 0 {
            return Err(QueueError::Config("max_retries must be at least 1".into()));
        }
        Ok(())
    }

    /// Load from environment variables.
    ///
    /// `SPOOL_QUEUE` is required; see [`QueueConfig::with_env_overrides`]
    /// for the optional ones.
    pub fn from_env() -> Result<Self> {
        Self::new(required_var("SPOOL_QUEUE")?).with_env_overrides()
    }

    /// Apply `SPOOL_MAX_RETRIES`, `SPOOL_WAIT_MS`, `SPOOL_SINGLE_CONSUMER`
    /// and `SPOOL_KEY_PREFIX` when they are set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(max_retries) = optional_var("SPOOL_MAX_RETRIES")? {
            self.max_retries = max_retries;
        }
        if let Some(wait_ms) = optional_var::<u64>("SPOOL_WAIT_MS")? {
            self.wait = Duration::from_millis(wait_ms);
        }
        if let Some(single) = optional_var::<bool>("SPOOL_SINGLE_CONSUMER")? {
            self.concurrent_consumers = !single;
        }
        if let Some(prefix) = optional_var("SPOOL_KEY_PREFIX")? {
            self.key_prefix = prefix;
        }
        Ok(self)
    }
}

/// Connection parameters for the backing store.
#[derive(Debug)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub auth: Option<SecretString>,
    /// Logical database index.
    pub database: Option<i64>,
}

impl StoreConfig {
    pub const DEFAULT_PORT: u16 = 6379;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auth: None,
            database: None,
        }
    }

    pub fn auth(mut self, secret: impl Into<String>) -> Self {
        self.auth = Some(SecretString::from(secret.into()));
        self
    }

    pub fn database(mut self, index: i64) -> Self {
        self.database = Some(index);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(QueueError::Config("store host can not be empty".into()));
        }
        if self.port == 0 {
            return Err(QueueError::Config("store port can not be 0".into()));
        }
        if matches!(self.database, Some(index) if index < 0) {
            return Err(QueueError::Config("store database index can not be negative".into()));
        }
        Ok(())
    }

    /// Load from environment variables.
    ///
    /// `SPOOL_REDIS_HOST` is required; `SPOOL_REDIS_PORT`, `SPOOL_REDIS_AUTH`
    /// and `SPOOL_REDIS_DB` are optional.
    pub fn from_env() -> Result<Self> {
        let port = optional_var("SPOOL_REDIS_PORT")?.unwrap_or(Self::DEFAULT_PORT);
        Ok(Self {
            host: required_var("SPOOL_REDIS_HOST")?,
            port,
            auth: optional_var::<String>("SPOOL_REDIS_AUTH")?
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
            database: optional_var("SPOOL_REDIS_DB")?,
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| QueueError::Config(format!("required environment variable {name} is not set")))
}

fn optional_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| QueueError::Config(format!("invalid value for {name}: {raw:?}"))),
        Err(_) => Ok(None),
    }
}
