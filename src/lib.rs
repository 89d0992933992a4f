//! # Rust Async Logger
//!
//! A named, leveled logger with double-buffered asynchronous delivery.
//!
//! ## Features
//!
//! - **Low producer overhead**: entries are built from pooled records and
//!   pushed into a double buffer; the calling thread never touches an appender
//!   in asynchronous mode
//! - **Ordered delivery**: a flush runner drains one generation at a time, so
//!   appenders see entries in push order
//! - **Per-level hooks**: observe entries of a chosen level as they are emitted
//! - **Isolated appenders**: one failing or panicking appender does not keep
//!   the others from receiving an entry
//!
//! ## Example
//!
//! ```
//! use rust_async_logger::prelude::*;
//! use rust_async_logger::{info, warn};
//!
//! let memory = MemoryAppender::new();
//! let logger = Logger::builder("app")
//!     .level(LogLevel::Info)
//!     .appender(memory.clone())
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "listening on {}", 8080).unwrap();
//! warn!(logger, tag = "db", "slow query").unwrap();
//!
//! logger.flush(true).unwrap();
//! assert_eq!(memory.len(), 2);
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::MemoryAppender;
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleAppender;
    #[cfg(feature = "file")]
    pub use crate::appenders::FileAppender;
    pub use crate::core::{
        Appender, FlushRunner, LineLayout, LogEntry, LogLevel, Logger, LoggerBuilder,
        LoggerConfig, LoggerError, LoggerManager, LoggerMetrics, Result, TimestampFormat,
    };
}

pub use appenders::MemoryAppender;
#[cfg(feature = "console")]
pub use appenders::ConsoleAppender;
#[cfg(feature = "file")]
pub use appenders::FileAppender;
pub use core::{
    Appender, AppenderHealth, FlushRunner, Hook, LineLayout, LogEntry, LogLevel, LogPools,
    Logger, LoggerBuilder, LoggerConfig, LoggerConfigBuilder, LoggerError, LoggerManager,
    LoggerMetrics, ObjectPool, Pooled, Recycle, Result, TimestampFormat,
    DEFAULT_FLUSH_INTERVAL, DEFAULT_HIGH_WATER_MARK, DEFAULT_POOL_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
