//! Logger configuration
//!
//! A [`LoggerConfig`] is bound to a logger once, by `Logger::initialize`, and
//! is read-only afterwards. It can be built in code with
//! [`LoggerConfig::builder`] or parsed from JSON:
//!
//! ```
//! use rust_async_logger::{LoggerConfig, LogLevel};
//!
//! let config = LoggerConfig::from_json(
//!     r#"{ "level": "warn", "flush_interval": 250, "async_mode": true }"#,
//! ).unwrap();
//! assert_eq!(config.level, LogLevel::Warn);
//! ```
//!
//! `level` and `flush_interval` (milliseconds) are required in JSON form;
//! everything else falls back to the defaults below.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Per-buffer entry count that opens the flush gate early
pub const DEFAULT_HIGH_WATER_MARK: usize = 4096;

/// Idle records kept by each of the logger's pools
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLoggerConfig")]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub async_mode: bool,
    /// Root-logger option owned by the configuring application; the engine
    /// only stores and reports it.
    pub take_over: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub flush_interval: Duration,
    pub high_water_mark: usize,
    pub pool_capacity: usize,
    pub max_outstanding_entries: Option<usize>,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Debug,
            async_mode: true,
            take_over: false,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            max_outstanding_entries: None,
        }
    }
}

impl LoggerConfig {
    #[must_use]
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::new()
    }

    /// Parse and validate a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LoggerError::config("LoggerConfig", e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.high_water_mark == 0 {
            return Err(LoggerError::config(
                "LoggerConfig",
                "high_water_mark must be at least 1",
            ));
        }
        if self.pool_capacity == 0 {
            return Err(LoggerError::config(
                "LoggerConfig",
                "pool_capacity must be at least 1",
            ));
        }
        if self.max_outstanding_entries == Some(0) {
            return Err(LoggerError::config(
                "LoggerConfig",
                "max_outstanding_entries must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Number(i64),
    Name(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLoggerConfig {
    level: Option<RawLevel>,
    async_mode: Option<bool>,
    take_over: Option<bool>,
    flush_interval: Option<i64>,
    high_water_mark: Option<usize>,
    pool_capacity: Option<usize>,
    max_outstanding_entries: Option<usize>,
}

impl TryFrom<RawLoggerConfig> for LoggerConfig {
    type Error = LoggerError;

    fn try_from(raw: RawLoggerConfig) -> Result<Self> {
        let level = match raw.level {
            None => return Err(LoggerError::config("LoggerConfig", "missing field `level`")),
            Some(RawLevel::Number(n)) => LogLevel::try_from(n)
                .map_err(|e| LoggerError::config("LoggerConfig", e.to_string()))?,
            Some(RawLevel::Name(name)) => name.parse()?,
        };

        let flush_interval = match raw.flush_interval {
            None => {
                return Err(LoggerError::config(
                    "LoggerConfig",
                    "missing field `flush_interval`",
                ))
            }
            Some(ms) if ms < 0 => {
                return Err(LoggerError::config(
                    "LoggerConfig",
                    format!("flush_interval must not be negative, got {}", ms),
                ))
            }
            Some(ms) => Duration::from_millis(ms as u64),
        };

        let defaults = LoggerConfig::default();
        let config = LoggerConfig {
            level,
            async_mode: raw.async_mode.unwrap_or(defaults.async_mode),
            take_over: raw.take_over.unwrap_or(defaults.take_over),
            flush_interval,
            high_water_mark: raw.high_water_mark.unwrap_or(defaults.high_water_mark),
            pool_capacity: raw.pool_capacity.unwrap_or(defaults.pool_capacity),
            max_outstanding_entries: raw.max_outstanding_entries,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Fluent builder for [`LoggerConfig`]
#[derive(Debug, Clone, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Buffer entries and deliver them on flush. When off, every emission is
    /// delivered to the appenders before it returns.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, enabled: bool) -> Self {
        self.config.async_mode = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn take_over(mut self, take_over: bool) -> Self {
        self.config.take_over = take_over;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn high_water_mark(mut self, entries: usize) -> Self {
        self.config.high_water_mark = entries;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn pool_capacity(mut self, records: usize) -> Self {
        self.config.pool_capacity = records;
        self
    }

    /// Cap on entries alive at once; emission fails with `PoolExhausted`
    /// beyond it.
    #[must_use = "builder methods return a new value"]
    pub fn max_outstanding_entries(mut self, limit: usize) -> Self {
        self.config.max_outstanding_entries = Some(limit);
        self
    }

    pub fn build(self) -> Result<LoggerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
