//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// An output sink fed by the logger's drain.
///
/// Appenders are called from whichever thread drains the logger (or from the
/// emitting thread for synchronous loggers). An appender that blocks stalls
/// that logger's drain; the core imposes no timeout.
pub trait Appender: Send {
    /// Write one entry. A failure is reported and counted, and the remaining
    /// appenders of the chain still receive the entry.
    fn append(&mut self, entry: &LogEntry) -> Result<()>;

    /// Flush internal buffering. `force` asks for durable completion
    /// (e.g. an fsync) rather than a best-effort handoff.
    fn flush(&mut self, force: bool) -> Result<()>;

    fn name(&self) -> &str;
}
