//! Core logger types and traits

pub mod appender;
pub mod appender_chain;
pub mod config;
pub mod double_buffer;
pub mod error;
pub mod flush_runner;
pub mod hooks;
pub mod layout;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod manager;
pub mod metrics;
pub mod pool;

pub use appender::Appender;
pub use appender_chain::{AppenderChain, AppenderHealth};
pub use config::{
    LoggerConfig, LoggerConfigBuilder, DEFAULT_FLUSH_INTERVAL, DEFAULT_HIGH_WATER_MARK,
    DEFAULT_POOL_CAPACITY,
};
pub use double_buffer::{DoubleBuffer, Generation, PooledEntry};
pub use error::{LoggerError, Result};
pub use flush_runner::{FlushRunner, DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TICK};
pub use hooks::{Hook, HookTable};
pub use layout::{LineLayout, TimestampFormat};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use manager::{LoggerManager, ROOT_LOGGER};
pub use metrics::LoggerMetrics;
pub use pool::{LogPools, ObjectPool, Pooled, Recycle};
