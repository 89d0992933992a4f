//! Console appender implementation

use crate::core::{Appender, LineLayout, LogEntry, LogLevel, Result, TimestampFormat};
use colored::Colorize;
use std::io::Write;

/// Writes one line per entry to the terminal.
///
/// Error and Fatal entries go to stderr, everything else to stdout.
pub struct ConsoleAppender {
    use_colors: bool,
    layout: LineLayout,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self::with_colors(true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            layout: LineLayout::default(),
        }
    }

    /// Replace the line layout
    ///
    /// # Example
    ///
    /// ```
    /// use rust_async_logger::appenders::ConsoleAppender;
    /// use rust_async_logger::LineLayout;
    ///
    /// let appender = ConsoleAppender::new()
    ///     .with_layout(LineLayout::new().with_thread(true));
    /// ```
    #[must_use]
    pub fn with_layout(mut self, layout: LineLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the timestamp format for this appender
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_async_logger::appenders::ConsoleAppender;
    /// use rust_async_logger::TimestampFormat;
    ///
    /// let appender = ConsoleAppender::new()
    ///     .with_timestamp_format(TimestampFormat::Iso8601Micros);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.layout.timestamp_format = format;
        self
    }

    fn format_line(&self, entry: &LogEntry) -> String {
        let mut line = String::with_capacity(64 + entry.len());
        let level = format!("{:5}", entry.level());
        let _ = if self.use_colors {
            let colored = level.color(entry.level().color_code());
            self.layout.write_with_level(entry, &colored, &mut line)
        } else {
            self.layout.write_with_level(entry, &level, &mut line)
        };
        line
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let line = self.format_line(entry);

        match entry.level() {
            LogLevel::Error | LogLevel::Fatal => writeln!(std::io::stderr().lock(), "{}", line)?,
            _ => writeln!(std::io::stdout().lock(), "{}", line)?,
        }
        Ok(())
    }

    fn flush(&mut self, _force: bool) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
