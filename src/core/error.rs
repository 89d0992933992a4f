//! Error types for the logger engine

use std::convert::Infallible;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Operation requires an initialized logger
    #[error("Logger '{name}' is not initialized")]
    NotInitialized { name: String },

    /// `initialize` called on a live logger
    #[error("Logger '{name}' is already initialized")]
    AlreadyInitialized { name: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Level value outside the defined range
    #[error("Invalid log level: {0}")]
    InvalidLevel(i64),

    /// Bounded pool has no capacity left
    #[error("Object pool '{pool}' exhausted: {outstanding}/{limit} records in use")]
    PoolExhausted {
        pool: &'static str,
        outstanding: usize,
        limit: usize,
    },

    /// Buffer growth could not be satisfied
    #[error("Failed to allocate {requested} bytes for log message")]
    AllocationFailure { requested: usize },

    /// A single appender failed; the rest of the chain is unaffected
    #[error("Appender '{appender}' failed: {message}")]
    AppenderFailure { appender: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    pub fn not_initialized(name: impl Into<String>) -> Self {
        LoggerError::NotInitialized { name: name.into() }
    }

    pub fn already_initialized(name: impl Into<String>) -> Self {
        LoggerError::AlreadyInitialized { name: name.into() }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn pool_exhausted(pool: &'static str, outstanding: usize, limit: usize) -> Self {
        LoggerError::PoolExhausted {
            pool,
            outstanding,
            limit,
        }
    }

    /// Create an appender failure error
    pub fn appender(appender: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::AppenderFailure {
            appender: appender.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

impl From<Infallible> for LoggerError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
