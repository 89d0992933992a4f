//! Named logger registry
//!
//! A [`LoggerManager`] builds one initialized [`Logger`] per configured name
//! and optionally drives them all with a single [`FlushRunner`]. A logger
//! named `"root"` must always be configured.

use super::config::LoggerConfig;
use super::error::{LoggerError, Result};
use super::flush_runner::{FlushRunner, DEFAULT_SHUTDOWN_TIMEOUT};
use super::logger::Logger;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const ROOT_LOGGER: &str = "root";

pub struct LoggerManager {
    loggers: Vec<(String, Arc<Logger>)>,
    runner: Option<FlushRunner>,
}

impl LoggerManager {
    /// Build and initialize every configured logger, keeping their order.
    pub fn from_configs<I, S>(configs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, LoggerConfig)>,
        S: Into<String>,
    {
        let mut loggers: Vec<(String, Arc<Logger>)> = Vec::new();
        for (name, config) in configs {
            let name = name.into();
            if loggers.iter().any(|(existing, _)| *existing == name) {
                return Err(LoggerError::config(
                    "LoggerManager",
                    format!("duplicate logger name '{}'", name),
                ));
            }
            let logger = Logger::with_config(name.clone(), config)?;
            loggers.push((name, Arc::new(logger)));
        }

        if !loggers.iter().any(|(name, _)| name == ROOT_LOGGER) {
            return Err(LoggerError::config(
                "LoggerManager",
                format!("no '{}' logger configured", ROOT_LOGGER),
            ));
        }

        Ok(Self {
            loggers,
            runner: None,
        })
    }

    /// Parse a JSON object mapping logger names to their configs.
    ///
    /// ```
    /// use rust_async_logger::LoggerManager;
    ///
    /// let manager = LoggerManager::from_json(r#"{
    ///     "root": { "level": "info", "flush_interval": 100 },
    ///     "net":  { "level": 0, "flush_interval": 50, "async_mode": false }
    /// }"#).unwrap();
    ///
    /// assert_eq!(manager.names(), vec!["net", "root"]);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| LoggerError::config("LoggerManager", e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(LoggerError::config(
                "LoggerManager",
                "expected an object of logger configs",
            ));
        };

        let mut configs = Vec::with_capacity(map.len());
        for (name, config) in map {
            let config: LoggerConfig = serde_json::from_value(config).map_err(|e| {
                LoggerError::config("LoggerManager", format!("logger '{}': {}", name, e))
            })?;
            configs.push((name, config));
        }
        Self::from_configs(configs)
    }

    pub fn root(&self) -> &Arc<Logger> {
        self.get(ROOT_LOGGER)
            .unwrap_or_else(|| unreachable!("root presence is checked at construction"))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Logger>> {
        self.loggers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, logger)| logger)
    }

    pub fn names(&self) -> Vec<&str> {
        self.loggers.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.runner.as_ref().is_some_and(FlushRunner::is_running)
    }

    /// Start one flush thread for all managed loggers. Starting it twice
    /// fails with `InvalidConfiguration`.
    pub fn start_runner(&mut self, tick: Duration) -> Result<()> {
        if self.runner.is_some() {
            return Err(LoggerError::config(
                "LoggerManager",
                "flush runner already started",
            ));
        }
        let loggers = self.loggers.iter().map(|(_, l)| Arc::clone(l)).collect();
        self.runner = Some(FlushRunner::spawn(loggers, tick)?);
        Ok(())
    }

    /// Stop the runner, then finalize every logger in configuration order.
    pub fn finalize(&mut self) {
        if let Some(mut runner) = self.runner.take() {
            runner.stop(DEFAULT_SHUTDOWN_TIMEOUT);
        }
        for (_, logger) in &self.loggers {
            logger.finalize();
        }
    }
}

impl Drop for LoggerManager {
    fn drop(&mut self) {
        self.finalize();
    }
}
