//! Logging macros for ergonomic log message formatting.
//!
//! These macros capture the call site with `file!()` and `line!()`, accept an
//! optional `tag = ...` before the format string, and defer formatting to the
//! logger, so a message below the threshold is never rendered. Each expands to
//! the logger's `Result<()>`.
//!
//! # Examples
//!
//! ```
//! use rust_async_logger::prelude::*;
//! use rust_async_logger::info;
//!
//! let logger = Logger::builder("app").build().unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started").unwrap();
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).unwrap();
//!
//! // With a tag
//! info!(logger, tag = "http", "accepted {} connections", 3).unwrap();
//! ```

/// Emit at a level chosen at runtime.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").build().unwrap();
/// use rust_async_logger::log;
/// let level = LogLevel::Warn;
/// log!(logger, level, "queue depth {}", 512).unwrap();
/// log!(logger, LogLevel::Error, tag = "db", "commit failed").unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, tag = $tag:expr, $($arg:tt)+) => {
        $logger.output(
            $level,
            ::core::option::Option::Some($tag),
            file!(),
            line!(),
            format_args!($($arg)+),
        )
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.output(
            $level,
            ::core::option::Option::None,
            file!(),
            line!(),
            format_args!($($arg)+),
        )
    };
}

/// Emit at `Trace`.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").level(LogLevel::Trace).build().unwrap();
/// use rust_async_logger::trace;
/// trace!(logger, "poll loop woke").unwrap();
/// trace!(logger, tag = "io", "{} bytes ready", 42).unwrap();
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, tag = $tag:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, tag = $tag, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Emit at `Debug`.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").build().unwrap();
/// use rust_async_logger::debug;
/// debug!(logger, "cache warmed").unwrap();
/// debug!(logger, "{} entries evicted", 10).unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, tag = $tag:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, tag = $tag, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Emit at `Info`.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").build().unwrap();
/// use rust_async_logger::info;
/// info!(logger, "listener bound").unwrap();
/// info!(logger, tag = "net", "{} peers connected", 100).unwrap();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, tag = $tag:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, tag = $tag, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Emit at `Warn`.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").build().unwrap();
/// use rust_async_logger::warn;
/// warn!(logger, "frame budget exceeded").unwrap();
/// warn!(logger, "reconnect attempt {} of {}", 3, 5).unwrap();
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, tag = $tag:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, tag = $tag, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Emit at `Error`.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").build().unwrap();
/// use rust_async_logger::error;
/// error!(logger, tag = "db", "pool timed out").unwrap();
/// error!(logger, "status {}: {}", 500, "upstream closed").unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, tag = $tag:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, tag = $tag, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Emit at `Fatal`. Delivery is the same as any other level.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").build().unwrap();
/// use rust_async_logger::fatal;
/// fatal!(logger, "heap corrupted").unwrap();
/// fatal!(logger, "cannot recover: {}", "disk full").unwrap();
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, tag = $tag:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, tag = $tag, $($arg)+)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
